//! Board grid state.
//!
//! Holds the colour placed on every cell plus the move counter. Uses a
//! fixed-size array indexed by `Hex::slot()` so the board is cheap to clone
//! for speculative search.

use super::colour::{Colour, NUM_COLOURS};
use super::hex::{Hex, ALL_DIRECTIONS, ALL_HEXES, BOARD_DIM, GRID_SLOTS, START_HEXES};
use super::moves::Move;

/// Channels in the per-cell board encoding: 6 colours, occupied, available.
pub const BOARD_CHANNELS: usize = NUM_COLOURS + 2;

/// Flat length of one encoded board (11 x 11 x 8).
pub const BOARD_TENSOR_LEN: usize = GRID_SLOTS * BOARD_CHANNELS;

const CHANNEL_OCCUPIED: usize = NUM_COLOURS;
const CHANNEL_AVAILABLE: usize = NUM_COLOURS + 1;

/// Per-colour points scored by a move.
pub type ScoreDelta = [u8; NUM_COLOURS];

/// Complete board state at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Colour>; GRID_SLOTS],
    /// Number of tiles placed so far (start hexes excluded).
    pub move_num: u8,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Creates a board with the six start hexes printed.
    pub fn new() -> Self {
        let mut board = Board::empty();
        for (hex, colour) in START_HEXES {
            board.cells[hex.slot()] = Some(colour);
        }
        board
    }

    /// Creates a board with no colours at all.
    pub fn empty() -> Self {
        Board {
            cells: [None; GRID_SLOTS],
            move_num: 0,
        }
    }

    /// Colour on a cell, if occupied.
    #[inline]
    pub fn get(&self, hex: Hex) -> Option<Colour> {
        self.cells[hex.slot()]
    }

    /// Sets a cell directly. Used to build test positions.
    pub fn set(&mut self, hex: Hex, colour: Option<Colour>) {
        self.cells[hex.slot()] = colour;
    }

    /// Returns true if the hex is on the board and unoccupied.
    #[inline]
    pub fn is_empty(&self, hex: Hex) -> bool {
        hex.is_on_board() && self.cells[hex.slot()].is_none()
    }

    /// Returns true if a tile could cover this hex: it is empty and has at
    /// least one empty neighbour.
    pub fn is_available(&self, hex: Hex) -> bool {
        self.is_empty(hex)
            && ALL_DIRECTIONS
                .iter()
                .any(|&d| hex.neighbour(d).is_some_and(|n| self.is_empty(n)))
    }

    /// Every unordered pair of adjacent empty hexes, in scan order.
    ///
    /// Each pair is listed once, with the earlier hex (in scan order) first.
    pub fn placements(&self) -> Vec<(Hex, Hex)> {
        let mut pairs = Vec::new();
        for &hex in ALL_HEXES.iter() {
            if !self.is_empty(hex) {
                continue;
            }
            for dir in ALL_DIRECTIONS {
                if let Some(n) = hex.neighbour(dir) {
                    if n.slot() > hex.slot() && self.is_empty(n) {
                        pairs.push((hex, n));
                    }
                }
            }
        }
        pairs
    }

    /// Returns true if any tile can still be placed.
    pub fn has_placement(&self) -> bool {
        ALL_HEXES.iter().any(|&h| self.is_available(h))
    }

    /// Places a move's colours and advances the move counter.
    pub fn place(&mut self, mv: &Move) {
        self.cells[mv.hex1.slot()] = Some(mv.colour1);
        self.cells[mv.hex2.slot()] = Some(mv.colour2);
        self.move_num = self.move_num.saturating_add(1);
    }

    /// Returns a copy of the board with the move placed.
    pub fn peek_after(&self, mv: &Move) -> Board {
        let mut next = self.clone();
        next.place(mv);
        next
    }

    /// Points a move would score, per colour.
    ///
    /// Each placed hex scores, in each direction except the one pointing at
    /// its partner, the run of consecutive cells already holding its colour.
    pub fn move_score(&self, mv: &Move) -> ScoreDelta {
        let mut delta = [0u8; NUM_COLOURS];
        for (hex, colour, partner) in [
            (mv.hex1, mv.colour1, mv.hex2),
            (mv.hex2, mv.colour2, mv.hex1),
        ] {
            let mut points = 0u8;
            for dir in ALL_DIRECTIONS {
                let mut cur = hex.neighbour(dir);
                if cur == Some(partner) {
                    continue;
                }
                while let Some(h) = cur {
                    if self.get(h) != Some(colour) {
                        break;
                    }
                    points += 1;
                    cur = h.neighbour(dir);
                }
            }
            let slot = &mut delta[colour.index()];
            *slot = slot.saturating_add(points);
        }
        delta
    }

    /// Scores every move in the batch. Output is aligned with the input.
    pub fn batch_move_scores(&self, moves: &[Move]) -> Vec<ScoreDelta> {
        moves.iter().map(|mv| self.move_score(mv)).collect()
    }

    /// Writes the 11 x 11 x 8 encoding (row, col, channel) into `out`.
    ///
    /// Off-board slots stay zero.
    pub fn encode_into(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), BOARD_TENSOR_LEN);
        out.fill(0);
        for &hex in ALL_HEXES.iter() {
            let base = (hex.row as usize * BOARD_DIM + hex.col as usize) * BOARD_CHANNELS;
            if let Some(colour) = self.get(hex) {
                out[base + colour.index()] = 1;
                out[base + CHANNEL_OCCUPIED] = 1;
            } else if self.is_available(hex) {
                out[base + CHANNEL_AVAILABLE] = 1;
            }
        }
    }

    /// Number of occupied on-board cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}
