//! Hand-coded move selection rules.
//!
//! Every rule works on a [`ScoredBatch`]: the mover's would-be scores for
//! each candidate, computed once per decision. Selection returns the index
//! of the chosen candidate; ties always resolve to the lowest index.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Move, NUM_COLOURS};
use crate::game::{GameState, Player};

/// Candidates plus their post-move scores for the mover.
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    pub moves: Vec<Move>,
    /// Mover's score before the move.
    pub pre: [u8; NUM_COLOURS],
    /// Opponent's current score.
    pub opp: [u8; NUM_COLOURS],
    /// Mover's score after each candidate, aligned with `moves`.
    pub post: Vec<[u8; NUM_COLOURS]>,
    pub ingenious: Vec<bool>,
}

impl ScoredBatch {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Total points gained by candidate `i`.
    #[inline]
    pub fn gain(&self, i: usize) -> u32 {
        sum(&self.post[i]) - sum(&self.pre)
    }
}

/// Enumerates the mover's candidates and batch-scores them.
pub fn score_candidates(state: &GameState, turn_of: Player) -> ScoredBatch {
    let moves = state.candidate_moves(turn_of);
    let deltas = state.board.batch_move_scores(&moves);
    let preview = state.score(turn_of).peek_next_scores(&deltas);
    ScoredBatch {
        moves,
        pre: state.score(turn_of).counts(),
        opp: state.score(turn_of.other()).counts(),
        post: preview.scores,
        ingenious: preview.ingenious,
    }
}

#[inline]
fn sum(scores: &[u8; NUM_COLOURS]) -> u32 {
    scores.iter().map(|&s| s as u32).sum()
}

fn min_indices(scores: &[u8; NUM_COLOURS]) -> Vec<usize> {
    let m = scores.iter().copied().min().unwrap_or(0);
    (0..NUM_COLOURS).filter(|&i| scores[i] == m).collect()
}

fn aggregate(scores: &[u8; NUM_COLOURS], colours: &[usize]) -> u32 {
    colours.iter().map(|&c| scores[c] as u32).sum()
}

/// First index maximising `key`. `None` on an empty range.
fn argmax_by<K: PartialOrd>(n: usize, key: impl Fn(usize) -> K) -> Option<usize> {
    let mut best: Option<(usize, K)> = None;
    for i in 0..n {
        let k = key(i);
        match &best {
            Some((_, bk)) if k <= *bk => {}
            _ => best = Some((i, k)),
        }
    }
    best.map(|(i, _)| i)
}

/// Largest total gain.
pub fn choose_max(batch: &ScoredBatch) -> usize {
    argmax_by(batch.len(), |i| batch.gain(i)).unwrap_or(0)
}

/// Largest aggregate over the colours in `target`, ties broken by gain.
/// Falls back to `fallback` when every aggregate is zero.
fn choose_raising(
    batch: &ScoredBatch,
    target: &[usize],
    fallback: impl FnOnce(&ScoredBatch) -> usize,
) -> usize {
    let best = argmax_by(batch.len(), |i| (aggregate(&batch.post[i], target), batch.gain(i)));
    match best {
        Some(i) if aggregate(&batch.post[i], target) > 0 => i,
        _ => fallback(batch),
    }
}

/// Raise the mover's weakest colours; Max when they all stay at zero.
pub fn choose_increase_min(batch: &ScoredBatch) -> usize {
    let target = min_indices(&batch.pre);
    choose_raising(batch, &target, choose_max)
}

/// Raise the mover's score on the opponent's weakest colours;
/// IncreaseMin when the mover holds nothing there.
pub fn choose_increase_other_min(batch: &ScoredBatch) -> usize {
    let target = min_indices(&batch.opp);
    choose_raising(batch, &target, choose_increase_min)
}

/// Per-colour shortfall against the opponent, widened by `margin`.
pub fn deficits(
    post: &[u8; NUM_COLOURS],
    opp: &[u8; NUM_COLOURS],
    margin: u8,
) -> [u32; NUM_COLOURS] {
    let mut out = [0u32; NUM_COLOURS];
    for k in 0..NUM_COLOURS {
        let d = opp[k] as i32 - post[k] as i32 + margin as i32;
        out[k] = d.max(0) as u32;
    }
    out
}

/// Smallest summed deficit, ties broken by gain.
pub fn choose_reduce_deficit(batch: &ScoredBatch, margin: u8) -> usize {
    let total = |i: usize| -> u32 { deficits(&batch.post[i], &batch.opp, margin).iter().sum() };
    argmax_by(batch.len(), |i| (std::cmp::Reverse(total(i)), batch.gain(i))).unwrap_or(0)
}

/// A single selection rule, resolved fresh for every decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    Random,
    Max,
    IncreaseMin,
    IncreaseOtherMin,
    ReduceDeficit(u8),
}

impl Rule {
    pub fn select(self, batch: &ScoredBatch, rng: &mut impl Rng) -> usize {
        match self {
            Rule::Random => rng.gen_range(0..batch.len().max(1)),
            Rule::Max => choose_max(batch),
            Rule::IncreaseMin => choose_increase_min(batch),
            Rule::IncreaseOtherMin => choose_increase_other_min(batch),
            Rule::ReduceDeficit(margin) => choose_reduce_deficit(batch, margin),
        }
    }
}

/// Decaying ReduceDeficit margin.
///
/// The margin drops by one (never below zero) each time `period` decisions
/// have been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginSchedule {
    pub margin: u8,
    pub period: u32,
    pub countdown: u32,
}

impl MarginSchedule {
    pub fn new(margin: u8, period: u32) -> Self {
        let period = period.max(1);
        MarginSchedule {
            margin,
            period,
            countdown: period,
        }
    }

    /// Fifteen, decremented after every decision.
    pub fn mixed3() -> Self {
        MarginSchedule::new(15, 1)
    }

    /// Five, decremented after every fifth decision.
    pub fn mixed4() -> Self {
        MarginSchedule::new(5, 5)
    }

    #[inline]
    pub fn current(&self) -> u8 {
        self.margin
    }

    /// Advances the schedule after a decision has been made.
    pub fn on_move_chosen(&mut self) {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.margin = self.margin.saturating_sub(1);
            self.countdown = self.period;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Colour, Hex, Tile};
    use crate::player::{Deck, Score};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn synthetic(
        pre: [u8; 6],
        opp: [u8; 6],
        post: Vec<[u8; 6]>,
    ) -> ScoredBatch {
        let tile = Tile::new(Colour::Red, Colour::Orange);
        let mv = Move::new(
            Hex::new(5, 4),
            Hex::new(5, 5),
            Colour::Red,
            Colour::Orange,
            tile,
        );
        ScoredBatch {
            moves: vec![mv; post.len()],
            pre,
            opp,
            ingenious: vec![false; post.len()],
            post,
        }
    }

    fn live_batch(seed: u64) -> (GameState, ScoredBatch) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut state = GameState::new(&mut rng);
        // Play a handful of moves so scores diverge.
        for _ in 0..6 {
            let p = state.turn;
            let batch = score_candidates(&state, p);
            let i = choose_max(&batch);
            state.apply_move(p, &batch.moves[i]);
            state.end_turn(p, false, &mut rng);
        }
        let batch = score_candidates(&state, state.turn);
        (state, batch)
    }

    #[test]
    fn max_is_optimal() {
        for seed in 0..5 {
            let (_, batch) = live_batch(seed);
            let chosen = choose_max(&batch);
            let best = (0..batch.len()).map(|i| batch.gain(i)).max().unwrap();
            assert_eq!(batch.gain(chosen), best);
            // First index among ties.
            assert!((0..chosen).all(|i| batch.gain(i) < best));
        }
    }

    #[test]
    fn increase_min_reaches_best_aggregate() {
        for seed in 0..5 {
            let (_, batch) = live_batch(seed);
            let target = min_indices(&batch.pre);
            let best = (0..batch.len())
                .map(|i| aggregate(&batch.post[i], &target))
                .max()
                .unwrap();
            let chosen = choose_increase_min(&batch);
            if best > aggregate(&batch.pre, &target) {
                assert_eq!(aggregate(&batch.post[chosen], &target), best);
            } else {
                assert_eq!(chosen, choose_max(&batch));
            }
        }
    }

    #[test]
    fn increase_min_breaks_ties_by_gain() {
        let batch = synthetic(
            [2, 3, 3, 3, 3, 3],
            [0; 6],
            vec![[3, 3, 3, 3, 3, 3], [3, 5, 3, 3, 3, 3], [2, 9, 3, 3, 3, 3]],
        );
        assert_eq!(choose_increase_min(&batch), 1);
        assert_eq!(choose_max(&batch), 2);
    }

    #[test]
    fn capped_colour_falls_back_to_max() {
        // Only the capped colour could move; nothing touches the zeros.
        let pre = [18, 0, 0, 0, 0, 0];
        let batch = synthetic(pre, [0; 6], vec![pre, pre, pre]);
        assert_eq!(choose_increase_min(&batch), choose_max(&batch));

        // On a real board with the same ledger.
        let deck = Deck::from_tiles(vec![Tile::new(Colour::Red, Colour::Red)]);
        let state = GameState::from_parts(
            Board::new(),
            [deck, Deck::new()],
            [Score::from_counts(pre), Score::default()],
            Player::One,
        );
        let batch = score_candidates(&state, Player::One);
        assert!(!batch.is_empty());
        assert_eq!(choose_increase_min(&batch), choose_max(&batch));
    }

    #[test]
    fn increase_other_min_targets_opponent_weakness() {
        let batch = synthetic(
            [1, 1, 1, 1, 1, 1],
            [4, 4, 0, 4, 4, 4],
            vec![[4, 1, 1, 1, 1, 1], [1, 1, 3, 1, 1, 1]],
        );
        assert_eq!(choose_increase_other_min(&batch), 1);

        // Nothing held on the opponent's weakest colour: IncreaseMin decides.
        let batch = synthetic(
            [0, 1, 0, 1, 1, 1],
            [4, 4, 0, 4, 4, 4],
            vec![[0, 5, 0, 1, 1, 1], [2, 1, 0, 1, 1, 1]],
        );
        assert_eq!(choose_increase_other_min(&batch), 1);
        assert_eq!(choose_max(&batch), 0);
    }

    #[test]
    fn increase_other_min_ties_on_held_points_go_to_gain() {
        // Both candidates keep 2 on the opponent's weakest colour; the
        // larger gain wins rather than IncreaseMin's pick.
        let batch = synthetic(
            [1, 2, 2, 2, 2, 2],
            [4, 4, 0, 4, 4, 4],
            vec![[1, 5, 2, 2, 2, 2], [2, 2, 2, 2, 2, 2]],
        );
        assert_eq!(choose_increase_min(&batch), 1);
        assert_eq!(choose_increase_other_min(&batch), 0);
        assert_eq!(choose_max(&batch), 0);
    }

    #[test]
    fn deficit_beats_raw_gain() {
        let batch = synthetic(
            [0; 6],
            [5, 0, 0, 0, 0, 0],
            vec![[5, 0, 0, 0, 0, 0], [0, 10, 0, 0, 0, 0]],
        );
        assert_eq!(choose_reduce_deficit(&batch, 0), 0);
        assert_eq!(choose_max(&batch), 1);
    }

    #[test]
    fn deficit_is_monotonic_in_margin() {
        let (_, batch) = live_batch(9);
        for post in &batch.post {
            for margin in 0..20u8 {
                let lo = deficits(post, &batch.opp, margin);
                let hi = deficits(post, &batch.opp, margin + 1);
                assert!(lo.iter().zip(hi.iter()).all(|(a, b)| a <= b));
            }
        }
    }

    #[test]
    fn random_covers_whole_range() {
        let post = vec![[0u8; 6]; 3];
        let batch = synthetic([0; 6], [0; 6], post);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[Rule::Random.select(&batch, &mut rng)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn schedules_decay_at_their_period() {
        let mut s3 = MarginSchedule::mixed3();
        for _ in 0..3 {
            s3.on_move_chosen();
        }
        assert_eq!(s3.current(), 12);
        for _ in 0..30 {
            s3.on_move_chosen();
        }
        assert_eq!(s3.current(), 0);

        let mut s4 = MarginSchedule::mixed4();
        for _ in 0..4 {
            s4.on_move_chosen();
        }
        assert_eq!(s4.current(), 5);
        s4.on_move_chosen();
        assert_eq!(s4.current(), 4);
    }

    #[test]
    fn schedule_survives_serde() {
        let mut s = MarginSchedule::mixed4();
        s.on_move_chosen();
        s.on_move_chosen();
        let json = serde_json::to_string(&s).unwrap();
        let back: MarginSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
