//! Per-player resources: score ledger, deck of held tiles, and the shared bag.

pub mod deck;
pub mod score;

pub use deck::{Bag, Deck, DECK_SIZE, DECK_TENSOR_LEN};
pub use score::{Score, ScorePreview, SCORE_CAP};
