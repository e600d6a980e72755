//! SVG rendering of a whole diagram
//!
//! Paint order matches the editor: groups, then connections, then element
//! cards on top. Coordinates are canvas units, one SVG unit each.

use std::fmt::Write;

use archstudio_core::route::{route_connections, ConnectionRoute};
use archstudio_core::{Category, ConnectionId, Diagram, Element, Group};
use archstudio_geometry::Point;

/// Smallest drawing surface, even for an empty diagram
const MIN_WIDTH: f64 = 1600.0;
const MIN_HEIGHT: f64 = 900.0;
const MARGIN: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgOptions {
    pub show_groups: bool,
    pub show_connections: bool,
    /// Connection drawn with a wider stroke and its tooltip
    pub hovered: Option<ConnectionId>,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            show_groups: true,
            show_connections: true,
            hovered: None,
        }
    }
}

pub fn render(diagram: &Diagram, options: SvgOptions) -> String {
    let mut output = String::new();
    let (width, height) = surface_size(diagram);

    let _ = writeln!(
        output,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{w}" height="{h}"
     viewBox="0 0 {w} {h}"
     style="background-color: white;">"#,
        w = fmt_num(width),
        h = fmt_num(height)
    );

    if options.show_groups {
        for group in diagram.groups() {
            render_group(&mut output, group);
        }
    }

    if options.show_connections {
        let routes = route_connections(diagram);
        for route in &routes {
            render_route(&mut output, route, options.hovered == Some(route.id));
        }
        let hovered = routes
            .iter()
            .find(|r| Some(r.id) == options.hovered)
            .and_then(|r| Some((r, diagram.connection(r.id)?)));
        if let Some((route, connection)) = hovered {
            render_tooltip(
                &mut output,
                route,
                &connection.protocol,
                connection.description.as_deref(),
            );
        }
    }

    for element in diagram.elements() {
        render_element(&mut output, element);
    }

    output.push_str("</svg>\n");
    output
}

fn surface_size(diagram: &Diagram) -> (f64, f64) {
    let bounds = diagram
        .elements()
        .map(Element::rect)
        .chain(diagram.groups().map(Group::rect))
        .reduce(|a, b| a.union(&b));
    match bounds {
        Some(rect) => (
            (rect.right() + MARGIN).max(MIN_WIDTH),
            (rect.bottom() + MARGIN).max(MIN_HEIGHT),
        ),
        None => (MIN_WIDTH, MIN_HEIGHT),
    }
}

fn render_group(output: &mut String, group: &Group) {
    let color = escape_xml(&group.color);
    let _ = writeln!(
        output,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="8" stroke="{}" stroke-width="2" stroke-dasharray="8,4" fill="{}" fill-opacity="0.08"/>"#,
        fmt_num(group.x),
        fmt_num(group.y),
        fmt_num(group.width),
        fmt_num(group.height),
        color,
        color
    );
    let _ = writeln!(
        output,
        r#"  <text x="{}" y="{}" font-family="sans-serif" font-size="13" font-weight="bold" fill="{}">{}</text>"#,
        fmt_num(group.x + 10.0),
        fmt_num(group.y + 20.0),
        color,
        escape_xml(&group.name)
    );
}

fn render_route(output: &mut String, route: &ConnectionRoute, hovered: bool) {
    let width = if hovered { 3 } else { 2 };
    let dash = if route.style.is_dashed() {
        format!(r#" stroke-dasharray="{}""#, route.style.dash)
    } else {
        String::new()
    };
    let _ = writeln!(
        output,
        r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"{}/>"#,
        fmt_num(route.from.x),
        fmt_num(route.from.y),
        fmt_num(route.to.x),
        fmt_num(route.to.y),
        route.style.color,
        width,
        dash
    );
    let [tip, left, right] = route.arrowhead_unrotated();
    let _ = writeln!(
        output,
        r#"  <polygon points="{} {}" fill="{}" transform="rotate({} {} {})"/>"#,
        point_pair(tip),
        [left, right].map(point_pair).join(" "),
        route.style.color,
        fmt_num(route.angle),
        fmt_num(route.to.x),
        fmt_num(route.to.y)
    );
}

fn render_tooltip(output: &mut String, route: &ConnectionRoute, protocol: &str, description: Option<&str>) {
    let rect = route.tooltip_rect();
    let _ = writeln!(
        output,
        r##"  <rect x="{}" y="{}" width="{}" height="{}" rx="4" fill="#1f2937" fill-opacity="0.9"/>"##,
        fmt_num(rect.x),
        fmt_num(rect.y),
        fmt_num(rect.width),
        fmt_num(rect.height)
    );
    let center = rect.center();
    let _ = writeln!(
        output,
        r#"  <text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="11" fill="white">{}</text>"#,
        fmt_num(center.x),
        fmt_num(rect.y + 16.0),
        escape_xml(protocol)
    );
    if let Some(description) = description {
        let _ = writeln!(
            output,
            r#"  <text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="9" fill="white">{}</text>"#,
            fmt_num(center.x),
            fmt_num(rect.y + 31.0),
            escape_xml(description)
        );
    }
}

fn render_element(output: &mut String, element: &Element) {
    let rect = element.rect();
    let accent = accent_color(element.kind.category());
    let _ = writeln!(
        output,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="6" stroke="{}" stroke-width="2" fill="white"/>"#,
        fmt_num(rect.x),
        fmt_num(rect.y),
        fmt_num(rect.width),
        fmt_num(rect.height),
        accent
    );
    let text_x = fmt_num(rect.center().x);
    let _ = writeln!(
        output,
        r#"  <text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="13" font-weight="bold" fill="black">{}</text>"#,
        text_x,
        fmt_num(rect.y + 40.0),
        escape_xml(&element.name)
    );
    let _ = writeln!(
        output,
        r#"  <text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="10" fill="{}">{}</text>"#,
        text_x,
        fmt_num(rect.y + 58.0),
        accent,
        escape_xml(element.kind.name())
    );
    if let Some(tech) = element.tech_stack.as_deref() {
        let _ = writeln!(
            output,
            r##"  <text x="{}" y="{}" text-anchor="middle" font-family="monospace" font-size="9" fill="#6b7280">{}</text>"##,
            text_x,
            fmt_num(rect.y + 76.0),
            escape_xml(tech)
        );
    }
}

fn accent_color(category: Category) -> &'static str {
    match category {
        Category::Actors => "#6366f1",
        Category::Containers => "#0ea5e9",
        Category::Infrastructure => "#64748b",
    }
}

fn point_pair(p: Point) -> String {
    format!("{},{}", fmt_num(p.x), fmt_num(p.y))
}

/// Whole numbers without a trailing `.0`, everything else to two decimals
fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
