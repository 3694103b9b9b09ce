//! Ingenious engine library.
//!
//! Rules engine, Representation encoder, value estimators, heuristic and
//! value-guided strategies, and the match / self-play loop.

pub mod board;
pub mod eval;
pub mod game;
pub mod nn;
pub mod player;
pub mod search;
pub mod selfplay;
pub mod strategy;
