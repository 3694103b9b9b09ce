//! Tile bag and player decks.
//!
//! A deck holds up to [`DECK_SIZE`] tiles. Exchanging the whole deck is
//! legal only when no held tile carries any of the player's lowest-scoring
//! colours. During simulation the opponent's hidden hand is stood in for by
//! a placeholder deck: it offers every tile kind, is never depleted, encodes
//! as all zeros and never permits an exchange.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{all_tile_kinds, full_tile_set, Colour, Tile, ALL_COLOURS, NUM_COLOURS};

use super::score::Score;

/// Tiles held by a player between turns.
pub const DECK_SIZE: usize = 6;

/// Flat length of an encoded deck (2 x 6).
pub const DECK_TENSOR_LEN: usize = 2 * NUM_COLOURS;

/// The shared draw pile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bag {
    tiles: Vec<Tile>,
}

impl Bag {
    /// A full, shuffled bag.
    pub fn full(rng: &mut impl Rng) -> Self {
        let mut tiles = full_tile_set();
        tiles.shuffle(rng);
        Bag { tiles }
    }

    /// A bag with exactly these tiles; the last one is drawn first.
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Bag { tiles }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Draws one tile, if any remain.
    pub fn draw(&mut self) -> Option<Tile> {
        self.tiles.pop()
    }

    /// Returns tiles to the bag and reshuffles.
    pub fn put_back(&mut self, tiles: &[Tile], rng: &mut impl Rng) {
        self.tiles.extend_from_slice(tiles);
        self.tiles.shuffle(rng);
    }
}

/// A player's hand of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deck {
    tiles: Vec<Tile>,
    placeholder: bool,
}

impl Deck {
    /// An empty deck.
    pub fn new() -> Self {
        Deck::default()
    }

    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Deck {
            tiles,
            placeholder: false,
        }
    }

    /// Stand-in for a hand the simulating player cannot see.
    pub fn placeholder() -> Self {
        Deck {
            tiles: all_tile_kinds(),
            placeholder: true,
        }
    }

    /// Tiles held, in draw order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Removes one copy of the tile. Returns false if it was not held.
    ///
    /// Placeholder decks are never depleted.
    pub fn play_tile(&mut self, tile: Tile) -> bool {
        if self.placeholder {
            return true;
        }
        match self.tiles.iter().position(|&t| t == tile) {
            Some(idx) => {
                self.tiles.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Decks after playing each tile in turn, one per input tile.
    pub fn peek_next_decks(&self, tiles: &[Tile]) -> Vec<Deck> {
        tiles
            .iter()
            .map(|&t| {
                let mut next = self.clone();
                next.play_tile(t);
                next
            })
            .collect()
    }

    /// Returns true if the player may swap their whole hand.
    pub fn can_exchange(&self, score: &Score) -> bool {
        if self.placeholder || self.tiles.is_empty() {
            return false;
        }
        let lowest: Vec<Colour> = score
            .min_indices()
            .into_iter()
            .map(|i| ALL_COLOURS[i])
            .collect();
        !self
            .tiles
            .iter()
            .any(|t| lowest.iter().any(|&c| t.contains(c)))
    }

    /// Batched [`Deck::can_exchange`] over aligned decks and scores.
    pub fn batch_can_exchange(decks: &[Deck], scores: &[[u8; NUM_COLOURS]]) -> Vec<bool> {
        decks
            .iter()
            .zip(scores.iter())
            .map(|(d, s)| d.can_exchange(&Score::from_counts(*s)))
            .collect()
    }

    /// Counts per colour: row 0 over mixed tiles, row 1 over doubles.
    pub fn encode(&self) -> [u8; DECK_TENSOR_LEN] {
        let mut out = [0u8; DECK_TENSOR_LEN];
        if self.placeholder {
            return out;
        }
        for tile in &self.tiles {
            let (a, b) = tile.colours();
            if tile.is_double() {
                out[NUM_COLOURS + a.index()] += 1;
            } else {
                out[a.index()] += 1;
                out[b.index()] += 1;
            }
        }
        out
    }

    /// Tops the hand up to [`DECK_SIZE`] from the bag.
    pub fn refill(&mut self, bag: &mut Bag) {
        if self.placeholder {
            return;
        }
        while self.tiles.len() < DECK_SIZE {
            match bag.draw() {
                Some(t) => self.tiles.push(t),
                None => break,
            }
        }
    }

    /// Draws a fresh hand, then returns the old tiles to the bag.
    pub fn exchange(&mut self, bag: &mut Bag, rng: &mut impl Rng) {
        let old = std::mem::take(&mut self.tiles);
        self.refill(bag);
        bag.put_back(&old, rng);
    }
}
