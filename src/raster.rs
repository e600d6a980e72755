//! Rasterizing diagram geometry into terminal cells.
//!
//! One terminal cell covers `CELL_WIDTH x CELL_HEIGHT` client pixels, so a
//! 160x100 card at 100% zoom is 16 columns by 5 rows.

use archstudio_geometry::{Point, Viewport};

pub const CELL_WIDTH: f64 = 10.0;
pub const CELL_HEIGHT: f64 = 20.0;

/// A terminal cell relative to the canvas area (can be off-screen)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Client-space pixel at the center of this cell
    pub fn to_client(self) -> Point {
        Point::new(
            (f64::from(self.x) + 0.5) * CELL_WIDTH,
            (f64::from(self.y) + 0.5) * CELL_HEIGHT,
        )
    }

    pub fn from_client(p: Point) -> Self {
        Self::new(
            (p.x / CELL_WIDTH).floor() as i32,
            (p.y / CELL_HEIGHT).floor() as i32,
        )
    }

    /// Cell under a canvas-space point for the given viewport
    pub fn from_canvas(p: Point, viewport: &Viewport) -> Self {
        Self::from_client(viewport.canvas_to_client(p))
    }
}

/// Border drawing style for boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxStyle {
    Solid,
    Rounded,
    Dashed,
    Heavy,
}

impl BoxStyle {
    /// (top-left, top-right, bottom-left, bottom-right, horizontal, vertical)
    fn chars(self) -> (char, char, char, char, char, char) {
        match self {
            BoxStyle::Solid => ('┌', '┐', '└', '┘', '─', '│'),
            BoxStyle::Rounded => ('╭', '╮', '╰', '╯', '─', '│'),
            BoxStyle::Dashed => ('┌', '┐', '└', '┘', '╌', '╎'),
            BoxStyle::Heavy => ('┏', '┓', '┗', '┛', '━', '┃'),
        }
    }
}

/// Bresenham walk from `from` to `to`, inclusive
pub fn line_cells(from: Cell, to: Cell) -> Vec<Cell> {
    let mut cells = Vec::new();

    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = from.x;
    let mut y = from.y;

    loop {
        cells.push(Cell::new(x, y));

        if x == to.x && y == to.y {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            if x == to.x {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == to.y {
                break;
            }
            err += dx;
            y += sy;
        }
    }

    cells
}

/// Line cells with glyphs chosen from the local direction. Dashed lines leave
/// every third cell blank.
pub fn styled_line(from: Cell, to: Cell, dashed: bool) -> Vec<(Cell, char)> {
    let cells = line_cells(from, to);
    if cells.len() == 1 {
        return vec![(from, '○')];
    }
    let diag = if (to.x > from.x) == (to.y > from.y) { '\\' } else { '/' };

    let mut out = Vec::with_capacity(cells.len());
    for (i, cell) in cells.iter().enumerate() {
        if dashed && i % 3 == 2 {
            continue;
        }
        let prev = cells[i.saturating_sub(1)];
        let next = cells[(i + 1).min(cells.len() - 1)];
        let ch = if next.y == prev.y {
            if dashed { '╌' } else { '─' }
        } else if next.x == prev.x {
            if dashed { '╎' } else { '│' }
        } else {
            diag
        };
        out.push((*cell, ch));
    }
    out
}

/// Arrowhead glyph for a direction given in degrees (screen y grows down)
pub fn arrow_char(angle: f64) -> char {
    let a = angle.rem_euclid(360.0);
    match a {
        a if !(22.5..337.5).contains(&a) => '►',
        a if a < 67.5 => '↘',
        a if a < 112.5 => '▼',
        a if a < 157.5 => '↙',
        a if a < 202.5 => '◄',
        a if a < 247.5 => '↖',
        a if a < 292.5 => '▲',
        _ => '↗',
    }
}

/// Border cells of the box spanning `from`..=`to`
pub fn box_cells(from: Cell, to: Cell, style: BoxStyle) -> Vec<(Cell, char)> {
    let mut cells = Vec::new();
    let (tl, tr, bl, br, h, v) = style.chars();

    let min_x = from.x.min(to.x);
    let max_x = from.x.max(to.x);
    let min_y = from.y.min(to.y);
    let max_y = from.y.max(to.y);

    if min_x == max_x && min_y == max_y {
        cells.push((Cell::new(min_x, min_y), '┼'));
        return cells;
    }
    if min_y == max_y {
        for x in min_x..=max_x {
            cells.push((Cell::new(x, min_y), h));
        }
        return cells;
    }
    if min_x == max_x {
        for y in min_y..=max_y {
            cells.push((Cell::new(min_x, y), v));
        }
        return cells;
    }

    cells.push((Cell::new(min_x, min_y), tl));
    cells.push((Cell::new(max_x, min_y), tr));
    cells.push((Cell::new(min_x, max_y), bl));
    cells.push((Cell::new(max_x, max_y), br));

    for x in (min_x + 1)..max_x {
        cells.push((Cell::new(x, min_y), h));
        cells.push((Cell::new(x, max_y), h));
    }
    for y in (min_y + 1)..max_y {
        cells.push((Cell::new(min_x, y), v));
        cells.push((Cell::new(max_x, y), v));
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line() {
        let cells = styled_line(Cell::new(0, 0), Cell::new(4, 0), false);
        assert_eq!(cells.len(), 5);
        assert!(cells.iter().all(|(_, ch)| *ch == '─'));
    }

    #[test]
    fn dashed_line_has_gaps() {
        let cells = styled_line(Cell::new(0, 0), Cell::new(0, 8), true);
        assert_eq!(cells.len(), 6);
        assert!(cells.iter().all(|(_, ch)| *ch == '╎'));
    }

    #[test]
    fn line_endpoints_included() {
        let cells = line_cells(Cell::new(2, 3), Cell::new(7, 5));
        assert_eq!(cells.first(), Some(&Cell::new(2, 3)));
        assert_eq!(cells.last(), Some(&Cell::new(7, 5)));
    }

    #[test]
    fn box_has_four_corners() {
        let cells = box_cells(Cell::new(0, 0), Cell::new(3, 2), BoxStyle::Rounded);
        let corners: Vec<char> = cells.iter().take(4).map(|(_, c)| *c).collect();
        assert_eq!(corners, vec!['╭', '╮', '╰', '╯']);
        assert_eq!(cells.len(), 4 + 2 * 2 + 2);
    }

    #[test]
    fn arrow_glyph_follows_angle() {
        assert_eq!(arrow_char(0.0), '►');
        assert_eq!(arrow_char(90.0), '▼');
        assert_eq!(arrow_char(180.0), '◄');
        assert_eq!(arrow_char(-90.0), '▲');
        assert_eq!(arrow_char(350.0), '►');
    }

    #[test]
    fn cell_mapping_round_trips() {
        let viewport = Viewport::default();
        let cell = Cell::from_canvas(Point::new(180.0, 150.0), &viewport);
        assert_eq!(cell, Cell::new(18, 7));
        assert_eq!(Cell::from_client(cell.to_client()), cell);
    }
}
