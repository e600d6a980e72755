use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

use archstudio_core::{route, Category, ConnectionKind, Element, Group};
use archstudio_geometry::{Point, Rect as CanvasRect};
use archstudio_session::Interaction;

use crate::app::{App, DetailField, Mode};
use crate::raster::{arrow_char, box_cells, styled_line, BoxStyle, Cell, CELL_HEIGHT, CELL_WIDTH};

/// Canvas units between background dots while grid snapping is on
const GRID_DOT_SPACING: f64 = 100.0;

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Canvas area
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    let canvas_area = chunks[0];
    frame.render_widget(CanvasWidget { app }, canvas_area);
    render_status_bar(frame, app, chunks[1]);
    render_help_bar(frame, app, chunks[2]);

    match &app.mode {
        Mode::NameInput { kind, text, .. } => {
            render_text_input(frame, &format!("New {}:", kind.name()), text, canvas_area);
        }
        Mode::GroupNameInput { text, .. } => {
            render_text_input(frame, "New group:", text, canvas_area);
        }
        Mode::ConnectionDetails {
            protocol,
            description,
            kind,
            field,
            ..
        } => {
            let (label, text) = match field {
                DetailField::Protocol => (format!("Protocol ({}, Tab to change):", kind.name()), protocol),
                DetailField::Description => (
                    format!("{} {} description (optional):", kind.name(), protocol.trim()),
                    description,
                ),
            };
            render_text_input(frame, &label, text, canvas_area);
        }
        Mode::ExportPrompt { format, path } => {
            render_text_input(frame, &format!("Export {} (Tab: format):", format), path, canvas_area);
        }
        Mode::Normal => {}
    }
}

/// Custom widget for rendering the diagram
struct CanvasWidget<'a> {
    app: &'a App,
}

impl CanvasWidget<'_> {
    fn cell_of(&self, p: Point) -> Cell {
        Cell::from_canvas(p, &self.app.editor.viewport())
    }

    /// Cells covered by a canvas rectangle, inclusive
    fn cell_bounds(&self, rect: CanvasRect) -> (Cell, Cell) {
        let from = self.cell_of(rect.origin());
        let to = self.cell_of(Point::new(rect.right(), rect.bottom()).translated(-1.0, -1.0));
        (from, Cell::new(to.x.max(from.x), to.y.max(from.y)))
    }

    fn render_char(&self, buf: &mut Buffer, area: Rect, cell: Cell, ch: char, style: Style) {
        if cell.x < 0 || cell.y < 0 {
            return;
        }
        let (Ok(dx), Ok(dy)) = (u16::try_from(cell.x), u16::try_from(cell.y)) else {
            return;
        };
        if dx < area.width && dy < area.height {
            buf[(area.x + dx, area.y + dy)].set_char(ch).set_style(style);
        }
    }

    fn render_text(&self, buf: &mut Buffer, area: Rect, at: Cell, max: i32, text: &str, style: Style) {
        for (i, ch) in text.chars().enumerate().take(max.max(0) as usize) {
            self.render_char(buf, area, Cell::new(at.x + i as i32, at.y), ch, style);
        }
    }

    /// Centered text on row `y` between columns `min_x` and `max_x` (borders excluded)
    fn render_centered(&self, buf: &mut Buffer, area: Rect, min_x: i32, max_x: i32, y: i32, text: &str, style: Style) {
        let inner = max_x - min_x - 1;
        if inner <= 0 {
            return;
        }
        let len = text.chars().count() as i32;
        let start = min_x + 1 + ((inner - len) / 2).max(0);
        self.render_text(buf, area, Cell::new(start, y), inner, text, style);
    }

    fn clear(&self, buf: &mut Buffer, area: Rect, from: Cell, to: Cell) {
        for y in from.y..=to.y {
            for x in from.x..=to.x {
                self.render_char(buf, area, Cell::new(x, y), ' ', Style::default());
            }
        }
    }

    fn render_grid(&self, buf: &mut Buffer, area: Rect) {
        if !self.app.editor.snap_to_grid() {
            return;
        }
        let viewport = self.app.editor.viewport();
        let style = Style::default().fg(Color::DarkGray);
        for row in 0..area.height {
            for column in 0..area.width {
                let top_left = Point::new(f64::from(column) * CELL_WIDTH, f64::from(row) * CELL_HEIGHT);
                let start = viewport.client_to_canvas(top_left);
                let end = viewport.client_to_canvas(top_left.translated(CELL_WIDTH, CELL_HEIGHT));
                let crosses = |a: f64, b: f64| (b / GRID_DOT_SPACING).floor() > (a / GRID_DOT_SPACING).floor();
                if crosses(start.x, end.x) && crosses(start.y, end.y) {
                    buf[(area.x + column, area.y + row)].set_char('·').set_style(style);
                }
            }
        }
    }

    fn render_group(&self, buf: &mut Buffer, area: Rect, group: &Group, selected: bool) {
        let (from, to) = self.cell_bounds(group.rect());
        let color = hex_color(&group.color);
        let style = if selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        for (cell, ch) in box_cells(from, to, BoxStyle::Dashed) {
            self.render_char(buf, area, cell, ch, style);
        }
        let title = format!(" {} ", group.name);
        self.render_text(buf, area, Cell::new(from.x + 2, from.y), to.x - from.x - 3, &title, style);

        if selected {
            for (cell, _) in box_cells(from, to, BoxStyle::Solid).into_iter().take(4) {
                self.render_char(buf, area, cell, '■', style);
            }
        }
    }

    fn render_connections(&self, buf: &mut Buffer, area: Rect) {
        let diagram = self.app.editor.diagram();
        let hovered = self.app.editor.hovered_connection();

        for connection in diagram.connections() {
            let (Some(source), Some(target)) =
                (diagram.element(connection.from), diagram.element(connection.to))
            else {
                continue;
            };
            let Some(route) = route::route_connection(diagram, connection) else {
                continue;
            };
            let mut style = Style::default().fg(connection_color(connection.kind));
            if hovered == Some(connection.id) {
                style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
            }

            let (source_from, source_to) = self.cell_bounds(source.rect());
            let (target_from, target_to) = self.cell_bounds(target.rect());
            let inside = |cell: &Cell, from: Cell, to: Cell| {
                (from.x..=to.x).contains(&cell.x) && (from.y..=to.y).contains(&cell.y)
            };

            let visible: Vec<(Cell, char)> = styled_line(
                self.cell_of(route.from),
                self.cell_of(route.to),
                route.style.is_dashed(),
            )
            .into_iter()
            .filter(|(cell, _)| {
                !inside(cell, source_from, source_to) && !inside(cell, target_from, target_to)
            })
            .collect();

            for (cell, ch) in &visible {
                self.render_char(buf, area, *cell, *ch, style);
            }
            if let Some((tip, _)) = visible.last() {
                self.render_char(buf, area, *tip, arrow_char(route.angle), style);
            }
        }
    }

    fn render_element(&self, buf: &mut Buffer, area: Rect, element: &Element, style: BoxStyle, highlight: Option<Color>) {
        let (from, to) = self.cell_bounds(element.rect());
        let accent = category_color(element.kind.category());
        let border = Style::default().fg(highlight.unwrap_or(accent));

        self.clear(buf, area, from, to);
        for (cell, ch) in box_cells(from, to, style) {
            self.render_char(buf, area, cell, ch, border);
        }

        let name_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        let mut lines = vec![
            (element.name.as_str(), name_style),
            (element.kind.name(), Style::default().fg(accent)),
        ];
        if let Some(tech) = element.tech_stack.as_deref() {
            lines.push((tech, Style::default().fg(Color::DarkGray)));
        }
        for (row, (text, text_style)) in lines.into_iter().enumerate() {
            let y = from.y + 1 + row as i32;
            if y >= to.y {
                break;
            }
            self.render_centered(buf, area, from.x, to.x, y, text, text_style);
        }
    }

    fn render_tooltip(&self, buf: &mut Buffer, area: Rect) {
        let diagram = self.app.editor.diagram();
        let Some(connection) = self
            .app
            .editor
            .hovered_connection()
            .and_then(|id| diagram.connection(id))
        else {
            return;
        };
        let Some(route) = route::route_connection(diagram, connection) else {
            return;
        };

        let (from, to) = self.cell_bounds(route.tooltip_rect());
        let to = Cell::new(to.x.max(from.x + 2), to.y.max(from.y + 2));
        let style = Style::default().fg(Color::White).bg(Color::Black);
        for y in from.y..=to.y {
            for x in from.x..=to.x {
                self.render_char(buf, area, Cell::new(x, y), ' ', style);
            }
        }
        for (cell, ch) in box_cells(from, to, BoxStyle::Solid) {
            self.render_char(buf, area, cell, ch, style.fg(Color::Gray));
        }
        let protocol = if connection.protocol.is_empty() {
            connection.kind.name()
        } else {
            connection.protocol.as_str()
        };
        self.render_centered(buf, area, from.x, to.x, from.y + 1, protocol, style.add_modifier(Modifier::BOLD));
        if let Some(description) = connection.description.as_deref().filter(|_| to.y - from.y > 2) {
            self.render_centered(buf, area, from.x, to.x, from.y + 2, description, style);
        }
    }
}

impl Widget for CanvasWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let editor = &self.app.editor;
        let selection = editor.selection();

        self.render_grid(buf, area);

        if editor.show_groups() {
            for group in editor.diagram().groups() {
                self.render_group(buf, area, group, selection.group == Some(group.id));
            }
        }

        if editor.show_connections() {
            self.render_connections(buf, area);
        }

        let pending = editor.interaction().pending_source();
        let dragging = match editor.interaction() {
            Interaction::DraggingElement { id, .. } => Some(*id),
            _ => None,
        };
        for element in editor.diagram().elements() {
            let (style, highlight) = if pending == Some(element.id) {
                (BoxStyle::Heavy, Some(Color::Magenta))
            } else if dragging == Some(element.id) {
                (BoxStyle::Dashed, Some(Color::Yellow))
            } else if selection.element == Some(element.id) {
                (BoxStyle::Heavy, Some(Color::Cyan))
            } else {
                (BoxStyle::Rounded, None)
            };
            self.render_element(buf, area, element, style, highlight);
        }

        if editor.show_connections() {
            self.render_tooltip(buf, area);
        }
    }
}

/// Render the status bar (Helix-style with mode indicator)
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (mode_name, mode_bg) = match &app.mode {
        Mode::Normal => match app.editor.interaction() {
            Interaction::DrawingConnection { .. } => ("LINK", Color::Magenta),
            Interaction::Idle => ("EDIT", Color::Blue),
            _ => ("DRAG", Color::Yellow),
        },
        Mode::NameInput { .. } | Mode::GroupNameInput { .. } | Mode::ConnectionDetails { .. } => {
            ("INS", Color::Green)
        }
        Mode::ExportPrompt { .. } => ("CMD", Color::Magenta),
    };

    let mode_style = Style::default()
        .fg(Color::Black)
        .bg(mode_bg)
        .add_modifier(Modifier::BOLD);

    let palette_style = Style::default()
        .fg(category_color(app.palette.category()))
        .add_modifier(Modifier::BOLD);

    let file_name = app
        .file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "[diagram]".to_string());

    let diagram = app.editor.diagram();
    let counts = format!(
        " {}e {}g {}c",
        diagram.element_count(),
        diagram.group_count(),
        diagram.connection_count()
    );

    let mut flags = String::new();
    if app.editor.snap_to_grid() {
        flags.push_str(" snap");
    }
    if !app.editor.show_connections() {
        flags.push_str(" -links");
    }
    if !app.editor.show_groups() {
        flags.push_str(" -groups");
    }

    let status_text = app
        .status_message
        .as_ref()
        .map(|m| format!(" {}", m))
        .unwrap_or_default();

    let spans = vec![
        Span::styled(format!(" {} ", mode_name), mode_style),
        Span::styled(format!(" {}", app.palette.name()), palette_style),
        Span::raw(format!(
            " {}{} {}% {}{}{}",
            file_name,
            counts,
            app.editor.zoom(),
            app.editor.level().name(),
            flags,
            status_text
        )),
    ];

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}

/// Render the help bar
fn render_help_bar(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match &app.mode {
        Mode::Normal => match app.editor.interaction() {
            Interaction::DrawingConnection { .. } => {
                "click source, then target | [c] or [Esc] leave connection mode"
            }
            _ => {
                "[a]dd [t]ype [g]roup [c]onnect [Del] delete [x] del link | [+/-/0] zoom [1-4] level | [G]rid [L]inks [H] groups [E]xport [w]rite [q]uit"
            }
        },
        Mode::NameInput { .. } | Mode::GroupNameInput { .. } => {
            "type name | [Enter] confirm [Esc] cancel [Backspace] delete"
        }
        Mode::ConnectionDetails {
            field: DetailField::Protocol,
            ..
        } => "type protocol | [Tab] type [Enter] next [Esc] cancel",
        Mode::ConnectionDetails { .. } => "type description | [Tab] type [Enter] connect [Esc] cancel",
        Mode::ExportPrompt { .. } => "type path | [Tab] format [Enter] export [Esc] cancel",
    };

    let paragraph = Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray));

    frame.render_widget(paragraph, area);
}

/// Render a one-line text prompt overlay
fn render_text_input(frame: &mut Frame, label: &str, text: &str, area: Rect) {
    let width = 50.min(area.width.saturating_sub(4));
    let height = 3;
    let x = (area.width.saturating_sub(width)) / 2 + area.x;
    let y = (area.height.saturating_sub(height)) / 2 + area.y;

    let popup_area = Rect::new(x, y, width, height).intersection(area);

    for py in popup_area.y..popup_area.y + popup_area.height {
        for px in popup_area.x..popup_area.x + popup_area.width {
            frame.buffer_mut()[(px, py)].set_char(' ');
        }
    }

    let block = Block::default()
        .title(label)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(format!("{}▏", text))
        .block(block)
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(paragraph, popup_area);
}

fn connection_color(kind: ConnectionKind) -> Color {
    hex_color(route::ConnectionStyle::for_kind(kind).color)
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Actors => Color::LightBlue,
        Category::Containers => Color::Cyan,
        Category::Infrastructure => Color::Gray,
    }
}

/// `#rrggbb` to a terminal color; anything else falls back to gray
fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| digits.get(i..i + 2).and_then(|s| u8::from_str_radix(s, 16).ok());
    match (digits.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use archstudio_core::{ConnectionDetails, Diagram, ElementKind, IdGenerator};
    use archstudio_session::{Editor, EditorConfig};
    use ratatui::{backend::TestBackend, Terminal};

    fn app_with_link() -> App {
        let mut diagram = Diagram::with_id_generator(IdGenerator::sequential());
        let a = diagram.add_element(ElementKind::WebApp, "Web", Point::new(0.0, 0.0));
        let b = diagram.add_element(ElementKind::Database, "Orders", Point::new(400.0, 0.0));
        diagram
            .add_connection(a.id, b.id, ConnectionDetails::new("SQL", ConnectionKind::Data))
            .unwrap();
        App::new(Editor::new(diagram, EditorConfig::default()), PathBuf::from("diagram.json"))
    }

    fn row(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width).map(|x| buffer[(x, y)].symbol()).collect()
    }

    #[test]
    fn draws_cards_and_arrow() {
        let app = app_with_link();
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let buffer = terminal.backend().buffer();

        assert!(row(buffer, 0).starts_with("╭──────────────╮"));
        assert!(row(buffer, 1).contains("Web"));
        assert!(row(buffer, 1).contains("Orders"));
        // Anchor row: line from card edge up to the arrow just outside the target
        let anchor = row(buffer, 2);
        assert!(anchor.contains("─►│"), "{anchor}");
    }

    #[test]
    fn status_bar_shows_zoom_and_level() {
        let app = app_with_link();
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let status = row(terminal.backend().buffer(), 10);
        assert!(status.contains("EDIT"));
        assert!(status.contains("2e 0g 1c"));
        assert!(status.contains("100% Container"));
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(hex_color("#8b5cf6"), Color::Rgb(0x8b, 0x5c, 0xf6));
        assert_eq!(hex_color("purple"), Color::Gray);
    }
}
