//! Moves and candidate-move enumeration.
//!
//! A move is an 8-field fixed tuple: two hexes, the colours placed on them,
//! and the two colours of the deck tile it consumes. The tile is carried
//! redundantly so scoring and deck updates never re-derive it.

use serde::{Deserialize, Serialize};

use super::colour::{Colour, Tile};
use super::hex::Hex;

/// A single tile placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "[u8; 8]", try_from = "[u8; 8]")]
pub struct Move {
    pub hex1: Hex,
    pub hex2: Hex,
    pub colour1: Colour,
    pub colour2: Colour,
    pub tile: Tile,
}

/// Errors decoding a persisted move.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    #[error("invalid colour index: {0}")]
    InvalidColour(u8),
    #[error("hex ({0}, {1}) is not on the board")]
    OffBoard(u8, u8),
    #[error("hexes are not adjacent")]
    NotAdjacent,
    #[error("placed colours do not match the tile")]
    TileMismatch,
}

impl Move {
    pub fn new(hex1: Hex, hex2: Hex, colour1: Colour, colour2: Colour, tile: Tile) -> Self {
        Move {
            hex1,
            hex2,
            colour1,
            colour2,
            tile,
        }
    }

    /// Flat `[r1, c1, r2, c2, colour1, colour2, tile_a, tile_b]` layout.
    pub fn to_array(self) -> [u8; 8] {
        let (a, b) = self.tile.colours();
        [
            self.hex1.row,
            self.hex1.col,
            self.hex2.row,
            self.hex2.col,
            self.colour1 as u8,
            self.colour2 as u8,
            a as u8,
            b as u8,
        ]
    }

    /// Decodes the flat layout, validating geometry and colours.
    pub fn from_array(raw: [u8; 8]) -> Result<Move, MoveError> {
        let colour = |v: u8| Colour::from_index(v as usize).ok_or(MoveError::InvalidColour(v));
        let hex = |r: u8, c: u8| {
            let h = Hex::new(r, c);
            if (r as usize) < super::hex::BOARD_DIM
                && (c as usize) < super::hex::BOARD_DIM
                && h.is_on_board()
            {
                Ok(h)
            } else {
                Err(MoveError::OffBoard(r, c))
            }
        };
        let hex1 = hex(raw[0], raw[1])?;
        let hex2 = hex(raw[2], raw[3])?;
        if hex1.direction_to(hex2).is_none() {
            return Err(MoveError::NotAdjacent);
        }
        let colour1 = colour(raw[4])?;
        let colour2 = colour(raw[5])?;
        let tile = Tile::new(colour(raw[6])?, colour(raw[7])?);
        if Tile::new(colour1, colour2) != tile {
            return Err(MoveError::TileMismatch);
        }
        Ok(Move::new(hex1, hex2, colour1, colour2, tile))
    }
}

impl From<Move> for [u8; 8] {
    fn from(mv: Move) -> Self {
        mv.to_array()
    }
}

impl TryFrom<[u8; 8]> for Move {
    type Error = MoveError;

    fn try_from(raw: [u8; 8]) -> Result<Self, Self::Error> {
        Move::from_array(raw)
    }
}

/// Combines every placement with every distinct tile in `tiles`.
///
/// Order: placement, then tile (first occurrence order), then orientation.
/// Mixed tiles produce both orientations; doubles produce one.
pub fn combine_moves_and_deck(placements: &[(Hex, Hex)], tiles: &[Tile]) -> Vec<Move> {
    let mut distinct: Vec<Tile> = Vec::with_capacity(tiles.len());
    for &t in tiles {
        if !distinct.contains(&t) {
            distinct.push(t);
        }
    }

    let per_placement: usize = distinct
        .iter()
        .map(|t| if t.is_double() { 1 } else { 2 })
        .sum();
    let mut moves = Vec::with_capacity(placements.len() * per_placement);

    for &(h1, h2) in placements {
        for &tile in &distinct {
            let (a, b) = tile.colours();
            moves.push(Move::new(h1, h2, a, b, tile));
            if !tile.is_double() {
                moves.push(Move::new(h1, h2, b, a, tile));
            }
        }
    }
    moves
}
