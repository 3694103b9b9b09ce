//! Board representation and geometry.
//!
//! Contains the hex geometry, colours and tiles, the board grid, and the
//! move type with candidate enumeration and batched scoring.

pub mod colour;
pub mod hex;
pub mod moves;
pub mod state;

pub use colour::{all_tile_kinds, full_tile_set, Colour, Tile, ALL_COLOURS, NUM_COLOURS};
pub use hex::{Direction, Hex, ALL_DIRECTIONS, ALL_HEXES, BOARD_DIM, CELL_COUNT, START_HEXES};
pub use moves::{combine_moves_and_deck, Move, MoveError};
pub use state::{Board, ScoreDelta, BOARD_CHANNELS, BOARD_TENSOR_LEN};
