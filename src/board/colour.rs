//! Colours and tiles.
//!
//! A tile is an unordered pair of colours. The bag holds 120 tiles: five
//! copies of each double and six copies of each of the fifteen mixed pairs.

use serde::{Deserialize, Serialize};

/// Number of distinct colours.
pub const NUM_COLOURS: usize = 6;

/// Number of distinct tile kinds (6 doubles + 15 mixed pairs).
pub const NUM_TILE_KINDS: usize = 21;

/// Copies of each double tile in a full bag.
const DOUBLE_COPIES: usize = 5;

/// Copies of each mixed tile in a full bag.
const MIXED_COPIES: usize = 6;

/// One of the six tile colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Colour {
    Red = 0,
    Orange = 1,
    Yellow = 2,
    Green = 3,
    Blue = 4,
    Purple = 5,
}

/// All colours in index order.
pub const ALL_COLOURS: [Colour; NUM_COLOURS] = [
    Colour::Red,
    Colour::Orange,
    Colour::Yellow,
    Colour::Green,
    Colour::Blue,
    Colour::Purple,
];

impl Colour {
    /// Returns the colour's index (0..6).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Converts an index back into a colour.
    pub fn from_index(idx: usize) -> Option<Colour> {
        ALL_COLOURS.get(idx).copied()
    }
}

/// A two-colour tile. Stored with the lower colour first so that equality
/// ignores orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    lo: Colour,
    hi: Colour,
}

impl Tile {
    /// Creates a tile from two colours in any order.
    pub fn new(a: Colour, b: Colour) -> Self {
        if a <= b {
            Tile { lo: a, hi: b }
        } else {
            Tile { lo: b, hi: a }
        }
    }

    /// Returns the two colours, lower index first.
    #[inline]
    pub const fn colours(self) -> (Colour, Colour) {
        (self.lo, self.hi)
    }

    /// Returns true if both halves share a colour.
    #[inline]
    pub fn is_double(self) -> bool {
        self.lo == self.hi
    }

    /// Returns true if either half has the given colour.
    #[inline]
    pub fn contains(self, colour: Colour) -> bool {
        self.lo == colour || self.hi == colour
    }
}

/// Every distinct tile kind: doubles first, then mixed pairs in index order.
pub fn all_tile_kinds() -> Vec<Tile> {
    let mut kinds = Vec::with_capacity(NUM_TILE_KINDS);
    for &c in ALL_COLOURS.iter() {
        kinds.push(Tile::new(c, c));
    }
    for i in 0..NUM_COLOURS {
        for j in (i + 1)..NUM_COLOURS {
            kinds.push(Tile::new(ALL_COLOURS[i], ALL_COLOURS[j]));
        }
    }
    kinds
}

/// The unshuffled contents of a full bag.
pub fn full_tile_set() -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(NUM_COLOURS * DOUBLE_COPIES + 15 * MIXED_COPIES);
    for tile in all_tile_kinds() {
        let copies = if tile.is_double() {
            DOUBLE_COPIES
        } else {
            MIXED_COPIES
        };
        for _ in 0..copies {
            tiles.push(tile);
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_ignores_orientation() {
        assert_eq!(
            Tile::new(Colour::Blue, Colour::Red),
            Tile::new(Colour::Red, Colour::Blue)
        );
        assert_eq!(
            Tile::new(Colour::Blue, Colour::Red).colours(),
            (Colour::Red, Colour::Blue)
        );
    }

    #[test]
    fn tile_kinds_are_distinct() {
        let kinds = all_tile_kinds();
        assert_eq!(kinds.len(), NUM_TILE_KINDS);
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(kinds.iter().filter(|t| t.is_double()).count(), 6);
    }

    #[test]
    fn full_set_has_120_tiles() {
        let tiles = full_tile_set();
        assert_eq!(tiles.len(), 120);
        let doubles = tiles.iter().filter(|t| t.is_double()).count();
        assert_eq!(doubles, 30);
        // Every colour appears on the same number of tiles.
        for c in ALL_COLOURS {
            assert_eq!(tiles.iter().filter(|t| t.contains(c)).count(), 35);
        }
    }

    #[test]
    fn colour_index_roundtrip() {
        for c in ALL_COLOURS {
            assert_eq!(Colour::from_index(c.index()), Some(c));
        }
        assert_eq!(Colour::from_index(6), None);
    }
}
