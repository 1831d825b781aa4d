/// Grid geometry shared by every room: cell coordinates, directions,
/// and the pixel scale used for interpolated movement.

pub const GRID_WIDTH: usize = 30;
pub const GRID_HEIGHT: usize = 20;

/// Pixels per cell. Logical positions are cells; render positions are pixels.
pub const TILE_SIZE: f32 = 64.0;

/// A cell in the room grid. Signed so that stepping off an edge
/// produces a representable (and rejectable) coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32) -> Self {
        GridCell { x, y }
    }

    pub fn in_bounds(self) -> bool {
        self.x >= 0 && self.y >= 0
            && (self.x as usize) < GRID_WIDTH
            && (self.y as usize) < GRID_HEIGHT
    }

    pub fn offset(self, dir: Direction) -> GridCell {
        let (dx, dy) = dir.delta();
        GridCell::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: GridCell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Exactly one orthogonal step away. Diagonal neighbours and the
    /// cell itself do not count.
    pub fn is_orthogonally_adjacent(self, other: GridCell) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        (dx == 1 && dy == 0) || (dx == 0 && dy == 1)
    }

    /// Top-left pixel of this cell.
    pub fn to_pixels(self) -> (f32, f32) {
        (self.x as f32 * TILE_SIZE, self.y as f32 * TILE_SIZE)
    }
}

/// Movement direction requested by the input layer for this frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up    => (0, -1),
            Direction::Down  => (0, 1),
            Direction::Left  => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_excludes_diagonal_and_self() {
        let c = GridCell::new(5, 5);
        assert!(c.is_orthogonally_adjacent(GridCell::new(6, 5)));
        assert!(c.is_orthogonally_adjacent(GridCell::new(5, 4)));
        assert!(!c.is_orthogonally_adjacent(GridCell::new(6, 6)));
        assert!(!c.is_orthogonally_adjacent(c));
        assert!(!c.is_orthogonally_adjacent(GridCell::new(7, 5)));
    }

    #[test]
    fn bounds_reject_negative_and_overflow() {
        assert!(GridCell::new(0, 0).in_bounds());
        assert!(GridCell::new(29, 19).in_bounds());
        assert!(!GridCell::new(-1, 3).in_bounds());
        assert!(!GridCell::new(30, 3).in_bounds());
        assert!(!GridCell::new(3, 20).in_bounds());
    }

    #[test]
    fn offset_follows_screen_axes() {
        let c = GridCell::new(3, 3);
        assert_eq!(c.offset(Direction::Down), GridCell::new(3, 4));
        assert_eq!(c.offset(Direction::Up), GridCell::new(3, 2));
        assert_eq!(c.offset(Direction::Left), GridCell::new(2, 3));
    }
}
