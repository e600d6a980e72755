//! Canvas geometry for archstudio.
//!
//! Every coordinate stored in the diagram model lives in canvas space, which is
//! independent of the zoom factor. The [`Viewport`] maps client (pointer)
//! coordinates into canvas space and back; all drag and resize math happens on
//! the canvas side so it behaves the same at every zoom level.

use serde::{Deserialize, Serialize};

/// Rendered width of an element card
pub const CARD_WIDTH: f64 = 160.0;
/// Rendered height of an element card
pub const CARD_HEIGHT: f64 = 100.0;

/// Smallest width a group may be resized to
pub const MIN_GROUP_WIDTH: f64 = 200.0;
/// Smallest height a group may be resized to
pub const MIN_GROUP_HEIGHT: f64 = 150.0;

/// Zoom level at which one canvas unit equals one client unit
pub const DEFAULT_ZOOM: u16 = 100;

/// A point in either client or canvas space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const CARD: Size = Size {
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
    };

    pub const MIN_GROUP: Size = Size {
        width: MIN_GROUP_WIDTH,
        height: MIN_GROUP_HEIGHT,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Raise each dimension to at least the matching floor
    pub fn at_least(self, floor: Size) -> Self {
        Self::new(self.width.max(floor.width), self.height.max(floor.height))
    }
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Position of one of the four corners
    pub fn corner(&self, corner: ResizeCorner) -> Point {
        let x = if corner.moves_west() { self.x } else { self.right() };
        let y = if corner.moves_north() { self.y } else { self.bottom() };
        Point::new(x, y)
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Zoom multiplier for a zoom percentage (100 = 1.0)
pub fn zoom_factor(zoom_percent: u16) -> f64 {
    f64::from(zoom_percent.max(1)) / 100.0
}

/// Map a client point into canvas space.
///
/// `(client - origin) / (zoom / 100)`
pub fn to_canvas_space(client: Point, canvas_origin: Point, zoom_percent: u16) -> Point {
    let k = zoom_factor(zoom_percent);
    Point::new(
        (client.x - canvas_origin.x) / k,
        (client.y - canvas_origin.y) / k,
    )
}

/// Inverse of [`to_canvas_space`]
pub fn to_client_space(canvas: Point, canvas_origin: Point, zoom_percent: u16) -> Point {
    let k = zoom_factor(zoom_percent);
    Point::new(canvas.x * k + canvas_origin.x, canvas.y * k + canvas_origin.y)
}

/// Connection endpoint for a card whose top-left corner is `top_left`
pub fn anchor_point(top_left: Point) -> Point {
    top_left.translated(CARD_WIDTH / 2.0, CARD_HEIGHT / 2.0)
}

/// Rectangle covered by a card whose top-left corner is `top_left`
pub fn card_rect(top_left: Point) -> Rect {
    Rect::from_parts(top_left, Size::CARD)
}

/// Clamp both coordinates to be non-negative
pub fn clamp_non_negative(p: Point) -> Point {
    Point::new(p.x.max(0.0), p.y.max(0.0))
}

/// Clamp a box position so it stays within `[0, extent - item]` on both axes
pub fn clamp_to_extent(p: Point, item: Size, extent: Size) -> Point {
    let max_x = (extent.width - item.width).max(0.0);
    let max_y = (extent.height - item.height).max(0.0);
    Point::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y))
}

/// Round a point to the nearest multiple of `grid` on both axes
pub fn snap_to_grid(p: Point, grid: f64) -> Point {
    if grid <= 0.0 {
        return p;
    }
    Point::new((p.x / grid).round() * grid, (p.y / grid).round() * grid)
}

/// Angle of the segment `from -> to` in degrees, as used to rotate arrowheads.
///
/// A zero-length segment yields 0.
pub fn angle_degrees(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Shortest distance from `p` to the segment `a..b`
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Corner handle of a resizable group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeCorner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl ResizeCorner {
    pub const ALL: [ResizeCorner; 4] = [
        ResizeCorner::Nw,
        ResizeCorner::Ne,
        ResizeCorner::Sw,
        ResizeCorner::Se,
    ];

    /// Whether dragging this corner moves the west (left) edge
    pub fn moves_west(self) -> bool {
        matches!(self, ResizeCorner::Nw | ResizeCorner::Sw)
    }

    /// Whether dragging this corner moves the north (top) edge
    pub fn moves_north(self) -> bool {
        matches!(self, ResizeCorner::Nw | ResizeCorner::Ne)
    }

    pub fn name(self) -> &'static str {
        match self {
            ResizeCorner::Nw => "nw",
            ResizeCorner::Ne => "ne",
            ResizeCorner::Sw => "sw",
            ResizeCorner::Se => "se",
        }
    }
}

impl std::str::FromStr for ResizeCorner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nw" => Ok(ResizeCorner::Nw),
            "ne" => Ok(ResizeCorner::Ne),
            "sw" => Ok(ResizeCorner::Sw),
            "se" => Ok(ResizeCorner::Se),
            other => Err(format!("unknown corner '{other}'")),
        }
    }
}

/// Resize `rect` by dragging `corner` to `pointer` (canvas space).
///
/// Each moved edge is recomputed from the opposite, fixed edge. Width and
/// height never drop below `min`, and for the west/north edges the position
/// follows so the opposite corner stays anchored. The left/top edge is never
/// pushed past zero.
pub fn resize_rect(rect: Rect, corner: ResizeCorner, pointer: Point, min: Size) -> Rect {
    let mut out = rect;

    if corner.moves_west() {
        let right = rect.right();
        let x = (right - (right - pointer.x).max(min.width)).max(0.0);
        out.x = x;
        out.width = (right - x).max(min.width);
    } else {
        out.width = (pointer.x - rect.x).max(min.width);
    }

    if corner.moves_north() {
        let bottom = rect.bottom();
        let y = (bottom - (bottom - pointer.y).max(min.height)).max(0.0);
        out.y = y;
        out.height = (bottom - y).max(min.height);
    } else {
        out.height = (pointer.y - rect.y).max(min.height);
    }

    out
}

/// Maps between client space and canvas space for one canvas surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Client-space position of the canvas' top-left corner
    pub origin: Point,
    /// Zoom in percent
    pub zoom: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Point::ORIGIN)
    }
}

impl Viewport {
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            zoom: DEFAULT_ZOOM,
        }
    }

    /// Convert client coordinates to canvas coordinates
    pub fn client_to_canvas(&self, client: Point) -> Point {
        to_canvas_space(client, self.origin, self.zoom)
    }

    /// Convert canvas coordinates to client coordinates
    pub fn canvas_to_client(&self, canvas: Point) -> Point {
        to_client_space(canvas, self.origin, self.zoom)
    }

    pub fn factor(&self) -> f64 {
        zoom_factor(self.zoom)
    }

    /// Set the zoom, clamped to the range spanned by `min` and `max` (in
    /// either order). Returns true if it changed.
    pub fn set_zoom(&mut self, zoom: u16, min: u16, max: u16) -> bool {
        let clamped = zoom.clamp(min.min(max), min.max(max));
        let changed = clamped != self.zoom;
        self.zoom = clamped;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_space_divides_by_zoom() {
        let p = to_canvas_space(Point::new(250.0, 150.0), Point::new(50.0, 50.0), 200);
        assert_eq!(p, Point::new(100.0, 50.0));

        let p = to_canvas_space(Point::new(100.0, 100.0), Point::ORIGIN, 50);
        assert_eq!(p, Point::new(200.0, 200.0));
    }

    #[test]
    fn client_space_inverts_canvas_space() {
        let origin = Point::new(32.0, 32.0);
        let canvas = Point::new(123.0, 456.0);
        let client = to_client_space(canvas, origin, 150);
        let back = to_canvas_space(client, origin, 150);
        assert!((back.x - canvas.x).abs() < 1e-9);
        assert!((back.y - canvas.y).abs() < 1e-9);
    }

    #[test]
    fn anchor_is_card_center() {
        assert_eq!(anchor_point(Point::new(100.0, 100.0)), Point::new(180.0, 150.0));
        assert_eq!(anchor_point(Point::new(400.0, 100.0)), Point::new(480.0, 150.0));
        assert_eq!(card_rect(Point::ORIGIN).center(), anchor_point(Point::ORIGIN));
    }

    #[test]
    fn clamp_keeps_box_on_canvas() {
        let extent = Size::new(1000.0, 800.0);
        assert_eq!(
            clamp_to_extent(Point::new(-20.0, 900.0), Size::CARD, extent),
            Point::new(0.0, 700.0)
        );
        assert_eq!(clamp_non_negative(Point::new(-1.0, 5.0)), Point::new(0.0, 5.0));
    }

    #[test]
    fn snap_rounds_to_grid() {
        assert_eq!(snap_to_grid(Point::new(29.0, 31.0), 20.0), Point::new(20.0, 40.0));
        assert_eq!(snap_to_grid(Point::new(29.0, 31.0), 0.0), Point::new(29.0, 31.0));
    }

    #[test]
    fn se_resize_clamps_to_floor() {
        let rect = Rect::new(100.0, 100.0, 400.0, 250.0);
        let out = resize_rect(rect, ResizeCorner::Se, Point::new(150.0, 150.0), Size::MIN_GROUP);
        assert_eq!(out, Rect::new(100.0, 100.0, 200.0, 150.0));
    }

    #[test]
    fn nw_resize_keeps_opposite_corner_anchored() {
        let rect = Rect::new(100.0, 100.0, 400.0, 250.0);
        let out = resize_rect(rect, ResizeCorner::Nw, Point::new(50.0, 80.0), Size::MIN_GROUP);
        assert_eq!(out, Rect::new(50.0, 80.0, 450.0, 270.0));
        assert_eq!(out.corner(ResizeCorner::Se), rect.corner(ResizeCorner::Se));

        // Dragging past the floor pins the moving edge instead of flipping
        let out = resize_rect(rect, ResizeCorner::Nw, Point::new(480.0, 340.0), Size::MIN_GROUP);
        assert_eq!(out, Rect::new(300.0, 200.0, 200.0, 150.0));
    }

    #[test]
    fn ne_and_sw_mix_edges() {
        let rect = Rect::new(100.0, 100.0, 400.0, 250.0);
        let ne = resize_rect(rect, ResizeCorner::Ne, Point::new(600.0, 50.0), Size::MIN_GROUP);
        assert_eq!(ne, Rect::new(100.0, 50.0, 500.0, 300.0));

        let sw = resize_rect(rect, ResizeCorner::Sw, Point::new(0.0, 500.0), Size::MIN_GROUP);
        assert_eq!(sw, Rect::new(0.0, 100.0, 500.0, 400.0));
    }

    #[test]
    fn west_edge_never_crosses_zero() {
        let rect = Rect::new(20.0, 20.0, 300.0, 200.0);
        let out = resize_rect(rect, ResizeCorner::Nw, Point::new(-100.0, -100.0), Size::MIN_GROUP);
        assert_eq!(out, Rect::new(0.0, 0.0, 320.0, 220.0));
    }

    #[test]
    fn segment_distance_and_angle() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Point::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Point::new(3.0, 4.0), a, a), 5.0);
        assert_eq!(angle_degrees(a, b), 0.0);
        assert!((angle_degrees(a, Point::new(0.0, 10.0)) - 90.0).abs() < 1e-9);
        assert_eq!(angle_degrees(a, a), 0.0);
    }

    #[test]
    fn viewport_zoom_is_clamped() {
        let mut vp = Viewport::default();
        assert!(vp.set_zoom(300, 50, 200));
        assert_eq!(vp.zoom, 200);
        assert!(!vp.set_zoom(250, 50, 200));
        assert!(vp.set_zoom(10, 50, 200));
        assert_eq!(vp.zoom, 50);
    }

    #[test]
    fn viewport_zoom_tolerates_swapped_bounds() {
        let mut vp = Viewport::default();
        assert!(vp.set_zoom(20, 200, 50));
        assert_eq!(vp.zoom, 50);
        assert!(vp.set_zoom(900, 200, 50));
        assert_eq!(vp.zoom, 200);
    }

    #[test]
    fn corner_parsing() {
        assert_eq!("se".parse::<ResizeCorner>(), Ok(ResizeCorner::Se));
        assert!("middle".parse::<ResizeCorner>().is_err());
        for corner in ResizeCorner::ALL {
            assert_eq!(corner.name().parse::<ResizeCorner>(), Ok(corner));
        }
    }
}
