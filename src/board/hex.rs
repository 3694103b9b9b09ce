//! Hexagonal board geometry.
//!
//! The board is a hexagon of side six (91 cells) addressed by a square
//! (row, col) index on an 11x11 grid. Rows alternate their horizontal
//! offset: in "doubled" coordinates an odd row holds its cells at even
//! columns `2 * col`, an even row at odd columns `2 * col + 1`. In doubled
//! coordinates the six hex neighbours are `(r, c +- 2)` and `(r +- 1, c +- 1)`.
//!
//! Adjacency and the on-board mask are computed once via `LazyLock`.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::colour::Colour;

/// Side length of the square index grid.
pub const BOARD_DIM: usize = 11;

/// Number of slots in the square index grid (on- and off-board).
pub const GRID_SLOTS: usize = BOARD_DIM * BOARD_DIM;

/// Width of the doubled-coordinate (offset) grid.
pub const OFFSET_COLS: usize = 2 * (BOARD_DIM - 1) + 1;

/// Number of on-board cells.
pub const CELL_COUNT: usize = 91;

/// Hex distance from the centre to the rim.
pub const BOARD_RADIUS: u8 = 5;

const CENTRE_ROW: i32 = 5;
const CENTRE_COL: i32 = 10;

/// A board cell addressed by its square index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub row: u8,
    pub col: u8,
}

/// The six neighbour directions in doubled coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

pub const ALL_DIRECTIONS: [Direction; 6] = [
    Direction::East,
    Direction::West,
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthEast,
    Direction::SouthWest,
];

impl Direction {
    /// (row delta, doubled-column delta).
    const fn delta(self) -> (i32, i32) {
        match self {
            Direction::East => (0, 2),
            Direction::West => (0, -2),
            Direction::NorthEast => (-1, 1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (1, -1),
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Hex {
    pub const fn new(row: u8, col: u8) -> Self {
        Hex { row, col }
    }

    /// Index into a row-major `GRID_SLOTS` array.
    #[inline]
    pub const fn slot(self) -> usize {
        self.row as usize * BOARD_DIM + self.col as usize
    }

    /// Inverse of [`Hex::slot`].
    #[inline]
    pub const fn from_slot(slot: usize) -> Self {
        Hex {
            row: (slot / BOARD_DIM) as u8,
            col: (slot % BOARD_DIM) as u8,
        }
    }

    /// Column of this cell in the doubled-coordinate grid.
    #[inline]
    pub const fn offset_col(self) -> usize {
        offset_col(self.row as usize, self.col as usize)
    }

    /// Builds a hex from doubled coordinates, if the parity matches a cell.
    fn from_doubled(row: i32, dcol: i32) -> Option<Hex> {
        if row < 0 || row >= BOARD_DIM as i32 || dcol < 0 || dcol >= OFFSET_COLS as i32 {
            return None;
        }
        let col = if row % 2 == 0 {
            if dcol % 2 == 0 {
                return None;
            }
            (dcol - 1) / 2
        } else {
            if dcol % 2 != 0 {
                return None;
            }
            dcol / 2
        };
        Some(Hex::new(row as u8, col as u8))
    }

    /// Hex distance from the board centre.
    pub fn distance_from_centre(self) -> u8 {
        let dr = (self.row as i32 - CENTRE_ROW).abs();
        let dc = (self.offset_col() as i32 - CENTRE_COL).abs();
        (dr + ((dc - dr).max(0) / 2)) as u8
    }

    /// Returns true if the hex lies on the playing area.
    #[inline]
    pub fn is_on_board(self) -> bool {
        ON_BOARD[self.slot()]
    }

    /// The on-board neighbour in the given direction, if any.
    #[inline]
    pub fn neighbour(self, dir: Direction) -> Option<Hex> {
        NEIGHBOURS[self.slot()][dir.index()]
    }

    /// Direction from `self` to an adjacent `other`, if they touch.
    pub fn direction_to(self, other: Hex) -> Option<Direction> {
        ALL_DIRECTIONS
            .iter()
            .copied()
            .find(|&d| self.neighbour(d) == Some(other))
    }
}

/// Doubled-grid column for a (row, col) square index.
#[inline]
pub const fn offset_col(row: usize, col: usize) -> usize {
    if row % 2 == 0 {
        2 * col + 1
    } else {
        2 * col
    }
}

fn build_on_board() -> [bool; GRID_SLOTS] {
    let mut mask = [false; GRID_SLOTS];
    for (slot, on) in mask.iter_mut().enumerate() {
        let hex = Hex::from_slot(slot);
        *on = hex.offset_col() < OFFSET_COLS && hex.distance_from_centre() <= BOARD_RADIUS;
    }
    mask
}

fn build_neighbours() -> [[Option<Hex>; 6]; GRID_SLOTS] {
    let mut table = [[None; 6]; GRID_SLOTS];
    for (slot, entry) in table.iter_mut().enumerate() {
        let hex = Hex::from_slot(slot);
        if !ON_BOARD[slot] {
            continue;
        }
        for dir in ALL_DIRECTIONS {
            let (dr, dc) = dir.delta();
            let n = Hex::from_doubled(hex.row as i32 + dr, hex.offset_col() as i32 + dc);
            entry[dir.index()] = n.filter(|h| ON_BOARD[h.slot()]);
        }
    }
    table
}

static ON_BOARD: LazyLock<[bool; GRID_SLOTS]> = LazyLock::new(build_on_board);
static NEIGHBOURS: LazyLock<[[Option<Hex>; 6]; GRID_SLOTS]> = LazyLock::new(build_neighbours);

/// All on-board hexes in row-major scan order.
pub static ALL_HEXES: LazyLock<Vec<Hex>> = LazyLock::new(|| {
    (0..GRID_SLOTS)
        .map(Hex::from_slot)
        .filter(|h| ON_BOARD[h.slot()])
        .collect()
});

/// The six corner hexes and their pre-printed start colours.
pub const START_HEXES: [(Hex, Colour); 6] = [
    (Hex::new(0, 2), Colour::Red),
    (Hex::new(0, 7), Colour::Orange),
    (Hex::new(5, 0), Colour::Yellow),
    (Hex::new(5, 10), Colour::Green),
    (Hex::new(10, 2), Colour::Blue),
    (Hex::new(10, 7), Colour::Purple),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_has_91_cells() {
        assert_eq!(ALL_HEXES.len(), CELL_COUNT);
    }

    #[test]
    fn row_lengths_match_hexagon() {
        let expected = [6, 7, 8, 9, 10, 11, 10, 9, 8, 7, 6];
        for (row, &len) in expected.iter().enumerate() {
            let n = ALL_HEXES.iter().filter(|h| h.row as usize == row).count();
            assert_eq!(n, len, "row {}", row);
        }
    }

    #[test]
    fn start_hexes_are_corners() {
        for (hex, _) in START_HEXES {
            assert!(hex.is_on_board());
            assert_eq!(hex.distance_from_centre(), BOARD_RADIUS);
            let degree = ALL_DIRECTIONS
                .iter()
                .filter(|&&d| hex.neighbour(d).is_some())
                .count();
            assert_eq!(degree, 3, "corner {:?} should have 3 neighbours", hex);
        }
    }

    #[test]
    fn centre_has_six_neighbours() {
        let centre = Hex::new(5, 5);
        assert_eq!(centre.distance_from_centre(), 0);
        for dir in ALL_DIRECTIONS {
            assert!(centre.neighbour(dir).is_some());
        }
    }

    #[test]
    fn adjacency_is_symmetric() {
        for &hex in ALL_HEXES.iter() {
            for dir in ALL_DIRECTIONS {
                if let Some(n) = hex.neighbour(dir) {
                    assert!(n.direction_to(hex).is_some(), "{:?} -> {:?}", hex, n);
                }
            }
        }
    }

    #[test]
    fn even_and_odd_rows_interleave() {
        // (4, 0) sits at doubled column 1; its south-west neighbour is (5, 0).
        let hex = Hex::new(4, 0);
        assert_eq!(hex.neighbour(Direction::SouthWest), Some(Hex::new(5, 0)));
        assert_eq!(hex.neighbour(Direction::SouthEast), Some(Hex::new(5, 1)));
        assert_eq!(Hex::new(5, 0).neighbour(Direction::West), None);
    }
}
