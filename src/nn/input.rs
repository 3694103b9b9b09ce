//! Representation -> estimator input tensors.
//!
//! Produces two flat f32 tensors per batch:
//!   grid   [N, 10, 11, 21]  NCHW. Channels 0..8 are the board channels
//!          remapped onto the doubled-column grid so hex adjacency becomes
//!          plain 2-D adjacency; channel 8 is the playable-cell mask and
//!          channel 9 the radial index `(6 - distance from centre) / 6`.
//!   vector [N, 29]  deck / 4, scores / 18, general / (1, 2, 1, 1, 40).
//!
//! Optional augmentation permutes the six colour indices per row and flips
//! the grid along each axis with probability 1/2, once per call. Both flips
//! are symmetries of the hexagon in doubled coordinates.

use std::ops::Range;
use std::sync::LazyLock;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::hex::OFFSET_COLS;
use crate::board::{ALL_HEXES, BOARD_CHANNELS, BOARD_DIM, NUM_COLOURS};
use crate::player::DECK_TENSOR_LEN;

use super::encoding::{Representation, GENERAL_LEN, SCORES_TENSOR_LEN};

pub const GRID_ROWS: usize = BOARD_DIM;
pub const GRID_COLS: usize = OFFSET_COLS;
pub const GRID_CHANNELS: usize = BOARD_CHANNELS + 2;
const PLANE: usize = GRID_ROWS * GRID_COLS;

/// Flat length of one grid example.
pub const GRID_LEN: usize = GRID_CHANNELS * PLANE;

/// Flat length of one vector example.
pub const VECTOR_LEN: usize = DECK_TENSOR_LEN + SCORES_TENSOR_LEN + GENERAL_LEN;

const CHANNEL_PLAYABLE: usize = BOARD_CHANNELS;
const CHANNEL_RADIAL: usize = BOARD_CHANNELS + 1;

const DECK_SCALE: f32 = 4.0;
const SCORE_SCALE: f32 = 18.0;
const GENERAL_SCALE: [f32; GENERAL_LEN] = [1.0, 2.0, 1.0, 1.0, 40.0];

const IDENTITY: [usize; NUM_COLOURS] = [0, 1, 2, 3, 4, 5];

static PLAYABLE_CHANNEL: LazyLock<Vec<f32>> = LazyLock::new(|| {
    let mut plane = vec![0.0f32; PLANE];
    for hex in ALL_HEXES.iter() {
        plane[hex.row as usize * GRID_COLS + hex.offset_col()] = 1.0;
    }
    plane
});

static RADIAL_CHANNEL: LazyLock<Vec<f32>> = LazyLock::new(|| {
    let mut plane = vec![0.0f32; PLANE];
    for hex in ALL_HEXES.iter() {
        let ring = 6 - hex.distance_from_centre() as i32;
        plane[hex.row as usize * GRID_COLS + hex.offset_col()] = ring as f32 / 6.0;
    }
    plane
});

/// Estimator-ready tensors for a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub batch: usize,
    pub grid: Vec<f32>,
    pub vector: Vec<f32>,
}

/// A borrowed slice of a [`ModelInput`].
#[derive(Debug, Clone, Copy)]
pub struct InputView<'a> {
    pub batch: usize,
    pub grid: &'a [f32],
    pub vector: &'a [f32],
}

impl ModelInput {
    pub fn view(&self) -> InputView<'_> {
        InputView {
            batch: self.batch,
            grid: &self.grid,
            vector: &self.vector,
        }
    }

    /// Sequential sub-batches of at most `max_rows` rows, in order.
    ///
    /// `max_rows` must be non-zero.
    pub fn chunks(&self, max_rows: usize) -> impl Iterator<Item = InputView<'_>> {
        self.grid
            .chunks(max_rows.saturating_mul(GRID_LEN))
            .zip(self.vector.chunks(max_rows.saturating_mul(VECTOR_LEN)))
            .map(|(grid, vector)| InputView {
                batch: vector.len() / VECTOR_LEN,
                grid,
                vector,
            })
    }
}

/// Randomisation decisions for one call.
#[derive(Debug, Clone)]
pub struct Augmentation {
    perms: Vec<[usize; NUM_COLOURS]>,
    flip_rows: bool,
    flip_cols: bool,
}

impl Augmentation {
    /// Draws a colour permutation per row and one pair of flips.
    pub fn draw(rng: &mut impl Rng, rows: usize) -> Self {
        let perms = (0..rows)
            .map(|_| {
                let mut p = IDENTITY;
                p.shuffle(rng);
                p
            })
            .collect();
        Augmentation {
            perms,
            flip_rows: rng.gen_bool(0.5),
            flip_cols: rng.gen_bool(0.5),
        }
    }
}

/// Prepares estimator inputs without augmentation.
pub fn prepare_inputs(repr: &Representation) -> ModelInput {
    build_inputs(repr, None)
}

/// Prepares estimator inputs with freshly drawn augmentation.
pub fn prepare_inputs_augmented(repr: &Representation, rng: &mut impl Rng) -> ModelInput {
    let aug = Augmentation::draw(rng, repr.size);
    build_inputs(repr, Some(&aug))
}

/// Remaps, augments and normalises every row.
pub fn build_inputs(repr: &Representation, aug: Option<&Augmentation>) -> ModelInput {
    build_inputs_rows(repr, 0..repr.size, aug)
}

/// Like [`build_inputs`] for a contiguous block of rows. `aug` is indexed by
/// absolute row, so one draw can serve several blocks.
pub fn build_inputs_rows(
    repr: &Representation,
    rows: Range<usize>,
    aug: Option<&Augmentation>,
) -> ModelInput {
    let n = rows.len();
    let mut grid = vec![0.0f32; n * GRID_LEN];
    let mut vector = vec![0.0f32; n * VECTOR_LEN];
    let (flip_rows, flip_cols) = aug.map_or((false, false), |a| (a.flip_rows, a.flip_cols));

    for (out, i) in rows.enumerate() {
        let perm = aug.map_or(IDENTITY, |a| a.perms[i]);
        let board = repr.board_row(i);
        let g = &mut grid[out * GRID_LEN..(out + 1) * GRID_LEN];

        for hex in ALL_HEXES.iter() {
            let mut r = hex.row as usize;
            let mut c = hex.offset_col();
            if flip_rows {
                r = GRID_ROWS - 1 - r;
            }
            if flip_cols {
                c = GRID_COLS - 1 - c;
            }
            let src = hex.slot() * BOARD_CHANNELS;
            for ch in 0..BOARD_CHANNELS {
                let src_ch = if ch < NUM_COLOURS { perm[ch] } else { ch };
                g[ch * PLANE + r * GRID_COLS + c] = board[src + src_ch] as f32;
            }
        }
        g[CHANNEL_PLAYABLE * PLANE..(CHANNEL_PLAYABLE + 1) * PLANE]
            .copy_from_slice(&PLAYABLE_CHANNEL);
        g[CHANNEL_RADIAL * PLANE..(CHANNEL_RADIAL + 1) * PLANE].copy_from_slice(&RADIAL_CHANNEL);

        let v = &mut vector[out * VECTOR_LEN..(out + 1) * VECTOR_LEN];
        let deck = repr.deck_row(i);
        let scores = repr.scores_row(i);
        for row in 0..2 {
            for k in 0..NUM_COLOURS {
                let dst = row * NUM_COLOURS + k;
                let src = row * NUM_COLOURS + perm[k];
                v[dst] = deck[src] as f32 / DECK_SCALE;
                v[DECK_TENSOR_LEN + dst] = scores[src] as f32 / SCORE_SCALE;
            }
        }
        let general = repr.general_row(i);
        let off = DECK_TENSOR_LEN + SCORES_TENSOR_LEN;
        for k in 0..GENERAL_LEN {
            v[off + k] = general[k] as f32 / GENERAL_SCALE[k];
        }
    }

    ModelInput {
        batch: n,
        grid,
        vector,
    }
}
