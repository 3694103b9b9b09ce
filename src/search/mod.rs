//! Value-guided move search.
//!
//! Every candidate move (with both exchange flags where legal) is encoded,
//! estimated and ranked. Depth one plays the argmax. Depths two and three
//! expand the best `width` candidates on private clones of the game state:
//! the mover's turn is played out including bonus moves, then the
//! opponent's greedy reply, then (depth three) the mover's greedy
//! continuation. Values are always from the mover's perspective.
//!
//! The opponent's hand is hidden from the mover, so the reply is searched
//! with a placeholder deck offering every tile kind.

use std::sync::Arc;

use rand::rngs::SmallRng;
use tracing::{debug, trace};

use crate::board::{Move, NUM_COLOURS};
use crate::eval::{predict, EstimatorError, ValueEstimator};
use crate::game::{GameState, Player};
use crate::nn::{build_inputs_rows, encode_batched, Augmentation, Representation};
use crate::player::{Deck, SCORE_CAP};
use crate::strategy::{Decision, StrategyError};

/// Upper bound on moves in one turn: each bonus move caps at least one colour.
pub const MAX_CHAIN: usize = NUM_COLOURS * SCORE_CAP as usize;

/// Value recorded when the acting player wins a simulated game.
const WIN: f32 = 1.0;
/// Value recorded when the acting player loses or draws a simulated game.
const LOSS: f32 = -1.0;

/// Lookahead depth of a learned strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDepth {
    One,
    Two,
    Three,
}

/// How a simulated turn ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnOutcome {
    /// The game ended; value from the acting player's perspective.
    Terminal(f32),
    /// The game goes on; last estimate from the acting player's perspective.
    Continue(f32),
}

/// Shared estimator plus search tunables.
#[derive(Clone)]
pub struct SearchEngine {
    estimator: Arc<dyn ValueEstimator>,
    max_batch: usize,
    width: usize,
    augment: bool,
}

impl SearchEngine {
    pub fn new(
        estimator: Arc<dyn ValueEstimator>,
        max_batch: usize,
        width: usize,
        augment: bool,
    ) -> Self {
        SearchEngine {
            estimator,
            max_batch,
            width,
            augment,
        }
    }

    /// Chooses a move for `turn_of` at the given depth.
    pub fn choose_move(
        &self,
        state: &GameState,
        turn_of: Player,
        depth: SearchDepth,
        rng: &mut SmallRng,
    ) -> Result<Decision, StrategyError> {
        let moves = state.candidate_moves(turn_of);
        if moves.is_empty() {
            return Err(StrategyError::NoCandidates);
        }
        debug!(
            estimator = self.estimator.name(),
            candidates = moves.len(),
            ?depth,
            "ranking"
        );
        let (repr, subset) = encode_batched(state, turn_of, &moves);
        let values = self.evaluate(&repr, rng)?;

        let (row, value) = match depth {
            SearchDepth::One => {
                let row = best_row(&values).ok_or(StrategyError::NoFiniteValue)?;
                (row, values[row])
            }
            SearchDepth::Two | SearchDepth::Three => {
                let top = top_k(&values, self.width);
                if top.is_empty() {
                    return Err(StrategyError::NoFiniteValue);
                }
                debug!(expanded = top.len(), ?depth, "simulating");
                let mut best: Option<(usize, f32)> = None;
                for &row in &top {
                    let v = self.simulate(state, turn_of, subset[row], values[row], depth, rng)?;
                    trace!(row, predicted = values[row], simulated = v, "branch");
                    if best.map_or(true, |(_, b)| v > b) {
                        best = Some((row, v));
                    }
                }
                best.ok_or(StrategyError::NoFiniteValue)?
            }
        };

        let decision = Decision {
            mv: subset[row],
            should_exchange: repr.should_exchange(row),
            confidence: value,
        };
        debug!(
            row,
            value,
            should_exchange = decision.should_exchange,
            "resolved"
        );
        Ok(decision)
    }

    /// Prepares and estimates every row of `repr`, one block of at most
    /// `max_batch` rows at a time so large batches never materialise as a
    /// single tensor.
    pub fn evaluate(
        &self,
        repr: &Representation,
        rng: &mut SmallRng,
    ) -> Result<Vec<f32>, StrategyError> {
        if self.max_batch == 0 {
            return Err(EstimatorError::InvalidBatchSize.into());
        }
        let aug = self.augment.then(|| Augmentation::draw(rng, repr.size));
        let mut values = Vec::with_capacity(repr.size);
        let mut start = 0;
        while start < repr.size {
            let end = (start + self.max_batch).min(repr.size);
            let input = build_inputs_rows(repr, start..end, aug.as_ref());
            values.extend(predict(self.estimator.as_ref(), &input, self.max_batch)?);
            start = end;
        }
        Ok(values)
    }

    /// Best move and its estimate for `actor` in `node`, or `None` when the
    /// actor has nothing to play.
    fn greedy(
        &self,
        node: &GameState,
        actor: Player,
        rng: &mut SmallRng,
    ) -> Result<Option<(Move, f32)>, StrategyError> {
        let moves = node.candidate_moves(actor);
        let (repr, subset) = encode_batched(node, actor, &moves);
        if repr.is_empty() {
            return Ok(None);
        }
        let values = self.evaluate(&repr, rng)?;
        let row = best_row(&values).ok_or(StrategyError::NoFiniteValue)?;
        Ok(Some((subset[row], values[row])))
    }

    /// Plays `mv` for `actor` on `node`, then keeps taking the greedy bonus
    /// move while the last move was ingenious.
    pub fn mock_turn(
        &self,
        node: &mut GameState,
        actor: Player,
        mv: Move,
        value: f32,
        rng: &mut SmallRng,
    ) -> Result<TurnOutcome, StrategyError> {
        let mut mv = mv;
        let mut value = value;
        for _ in 0..MAX_CHAIN {
            let ingenious = node.apply_move(actor, &mv);
            if node.is_terminal() {
                let v = if node.winner() == Some(actor) { WIN } else { LOSS };
                return Ok(TurnOutcome::Terminal(v));
            }
            if ingenious == 0 {
                return Ok(TurnOutcome::Continue(value));
            }
            match self.greedy(node, actor, rng)? {
                Some((next, next_value)) => {
                    mv = next;
                    value = next_value;
                }
                None => return Ok(TurnOutcome::Continue(value)),
            }
        }
        Ok(TurnOutcome::Continue(value))
    }

    /// Value of playing `mv` now, from the mover's perspective.
    fn simulate(
        &self,
        state: &GameState,
        mover: Player,
        mv: Move,
        value: f32,
        depth: SearchDepth,
        rng: &mut SmallRng,
    ) -> Result<f32, StrategyError> {
        let mut node = state.clone();
        let opponent = mover.other();

        let mut recorded = match self.mock_turn(&mut node, mover, mv, value, rng)? {
            TurnOutcome::Terminal(v) => return Ok(v),
            TurnOutcome::Continue(v) => v,
        };

        node.decks[opponent.index()] = Deck::placeholder();
        if let Some((reply, reply_value)) = self.greedy(&node, opponent, rng)? {
            recorded = match self.mock_turn(&mut node, opponent, reply, reply_value, rng)? {
                TurnOutcome::Terminal(v) => return Ok(-v),
                TurnOutcome::Continue(v) => -v,
            };
        }
        if depth != SearchDepth::Three {
            return Ok(recorded);
        }

        if let Some((cont, cont_value)) = self.greedy(&node, mover, rng)? {
            recorded = match self.mock_turn(&mut node, mover, cont, cont_value, rng)? {
                TurnOutcome::Terminal(v) | TurnOutcome::Continue(v) => v,
            };
        }
        Ok(recorded)
    }
}

/// First row with the largest finite value.
pub fn best_row(values: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        if best.map_or(true, |b| v > values[b]) {
            best = Some(i);
        }
    }
    best
}

/// The `k` highest finite rows in ascending value order; equal values keep
/// their original relative order.
pub fn top_k(values: &[f32], k: usize) -> Vec<usize> {
    let mut rows: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite())
        .collect();
    rows.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let skip = rows.len().saturating_sub(k);
    rows.split_off(skip)
}
