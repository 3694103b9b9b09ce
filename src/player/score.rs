//! Per-player score ledger.
//!
//! Six colour counts, each capped at [`SCORE_CAP`]. Reaching the cap on a
//! colour is an "ingenious" event that grants a bonus move.

use serde::{Deserialize, Serialize};

use crate::board::{ScoreDelta, NUM_COLOURS};

/// Maximum points per colour.
pub const SCORE_CAP: u8 = 18;

/// A player's six colour scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Score {
    counts: [u8; NUM_COLOURS],
}

/// Would-be scores for a batch of score deltas, structure-of-arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScorePreview {
    pub scores: Vec<[u8; NUM_COLOURS]>,
    pub ingenious: Vec<bool>,
    pub num_ingenious: Vec<u8>,
}

impl ScorePreview {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl Score {
    /// Creates a score from raw counts, clamping to the cap.
    pub fn from_counts(counts: [u8; NUM_COLOURS]) -> Self {
        Score {
            counts: counts.map(|c| c.min(SCORE_CAP)),
        }
    }

    #[inline]
    pub fn counts(&self) -> [u8; NUM_COLOURS] {
        self.counts
    }

    #[inline]
    pub fn get(&self, colour_idx: usize) -> u8 {
        self.counts[colour_idx]
    }

    /// Lowest colour count.
    pub fn min(&self) -> u8 {
        self.counts.iter().copied().min().unwrap_or(0)
    }

    /// Indices of every colour currently at the minimum.
    pub fn min_indices(&self) -> Vec<usize> {
        let m = self.min();
        (0..NUM_COLOURS).filter(|&i| self.counts[i] == m).collect()
    }

    /// Returns true when every colour has reached the cap.
    pub fn all_capped(&self) -> bool {
        self.counts.iter().all(|&c| c >= SCORE_CAP)
    }

    /// Counts sorted ascending, used for winner comparison.
    pub fn sorted(&self) -> [u8; NUM_COLOURS] {
        let mut s = self.counts;
        s.sort_unstable();
        s
    }

    /// Computes the scores after a delta without mutating, returning the
    /// new counts and the number of colours that newly reached the cap.
    pub fn peek_next(&self, delta: &ScoreDelta) -> ([u8; NUM_COLOURS], u8) {
        let mut next = self.counts;
        let mut ingenious = 0u8;
        for (i, slot) in next.iter_mut().enumerate() {
            let before = *slot;
            *slot = before.saturating_add(delta[i]).min(SCORE_CAP);
            if before < SCORE_CAP && *slot == SCORE_CAP {
                ingenious += 1;
            }
        }
        (next, ingenious)
    }

    /// Batched [`Score::peek_next`].
    pub fn peek_next_scores(&self, deltas: &[ScoreDelta]) -> ScorePreview {
        let mut preview = ScorePreview {
            scores: Vec::with_capacity(deltas.len()),
            ingenious: Vec::with_capacity(deltas.len()),
            num_ingenious: Vec::with_capacity(deltas.len()),
        };
        for delta in deltas {
            let (next, n) = self.peek_next(delta);
            preview.scores.push(next);
            preview.ingenious.push(n > 0);
            preview.num_ingenious.push(n);
        }
        preview
    }

    /// Applies a delta in place. Returns the number of ingenious events.
    pub fn update(&mut self, delta: &ScoreDelta) -> u8 {
        let (next, n) = self.peek_next(delta);
        self.counts = next;
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_caps_and_reports_ingenious() {
        let mut score = Score::from_counts([16, 0, 0, 0, 0, 0]);
        let n = score.update(&[5, 1, 0, 0, 0, 0]);
        assert_eq!(n, 1);
        assert_eq!(score.counts(), [18, 1, 0, 0, 0, 0]);

        // Already capped colours never re-trigger.
        let n = score.update(&[3, 0, 0, 0, 0, 0]);
        assert_eq!(n, 0);
        assert_eq!(score.get(0), 18);
    }

    #[test]
    fn peek_does_not_mutate() {
        let score = Score::from_counts([17, 17, 0, 0, 0, 0]);
        let preview = score.peek_next_scores(&[[1, 1, 0, 0, 0, 0], [0, 0, 2, 0, 0, 0]]);
        assert_eq!(preview.len(), 2);
        assert_eq!(preview.num_ingenious, vec![2, 0]);
        assert_eq!(preview.ingenious, vec![true, false]);
        assert_eq!(preview.scores[1], [17, 17, 2, 0, 0, 0]);
        assert_eq!(score.counts(), [17, 17, 0, 0, 0, 0]);
    }

    #[test]
    fn min_indices_lists_ties() {
        let score = Score::from_counts([3, 1, 4, 1, 5, 9]);
        assert_eq!(score.min(), 1);
        assert_eq!(score.min_indices(), vec![1, 3]);
        assert_eq!(score.sorted(), [1, 1, 3, 4, 5, 9]);
    }

    #[test]
    fn from_counts_clamps() {
        let score = Score::from_counts([30, 18, 0, 0, 0, 0]);
        assert_eq!(score.get(0), SCORE_CAP);
        assert!(!score.all_capped());
        assert!(Score::from_counts([18; 6]).all_capped());
    }
}
