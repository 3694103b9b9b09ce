//! Deterministic value estimator.
//!
//! Reads only the normalised score block of each row. The mover's and the
//! opponent's scores are sorted ascending and compared rank by rank with
//! geometrically decaying weights, so the weakest colours dominate just as
//! they do in the winner rule. The weighted lead (in points) is squashed
//! through a logistic curve into (0, 1).

use crate::board::NUM_COLOURS;
use crate::nn::{InputView, VECTOR_LEN};
use crate::player::{DECK_TENSOR_LEN, SCORE_CAP};

use super::estimator::{EstimatorError, ValueEstimator};

const RANK_WEIGHTS: [f32; NUM_COLOURS] = [1.0, 0.5, 0.25, 0.125, 0.0625, 0.03125];

/// Points of weighted lead that move the estimate by one logit.
const DEFAULT_TEMPERATURE: f32 = 2.0;

/// Score-based estimator used when no checkpoint is configured.
#[derive(Debug, Clone)]
pub struct HeuristicEstimator {
    temperature: f32,
}

impl Default for HeuristicEstimator {
    fn default() -> Self {
        HeuristicEstimator {
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl HeuristicEstimator {
    pub fn new(temperature: f32) -> Self {
        HeuristicEstimator { temperature }
    }

    /// Value for a single normalised vector row.
    pub fn row_value(&self, row: &[f32]) -> f32 {
        let scale = SCORE_CAP as f32;
        let mut mine = [0.0f32; NUM_COLOURS];
        let mut theirs = [0.0f32; NUM_COLOURS];
        for k in 0..NUM_COLOURS {
            mine[k] = row[DECK_TENSOR_LEN + k] * scale;
            theirs[k] = row[DECK_TENSOR_LEN + NUM_COLOURS + k] * scale;
        }
        mine.sort_by(f32::total_cmp);
        theirs.sort_by(f32::total_cmp);

        let lead: f32 = RANK_WEIGHTS
            .iter()
            .zip(mine.iter().zip(theirs.iter()))
            .map(|(w, (m, t))| w * (m - t))
            .sum();
        sigmoid(lead / self.temperature)
    }
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl ValueEstimator for HeuristicEstimator {
    fn estimate(&self, input: InputView<'_>) -> Result<Vec<f32>, EstimatorError> {
        if input.vector.len() != input.batch * VECTOR_LEN {
            return Err(EstimatorError::Inference(format!(
                "vector tensor holds {} floats, expected {}",
                input.vector.len(),
                input.batch * VECTOR_LEN
            )));
        }
        Ok(input
            .vector
            .chunks(VECTOR_LEN)
            .map(|row| self.row_value(row))
            .collect())
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::ModelInput;

    fn row(mine: [u8; 6], theirs: [u8; 6]) -> Vec<f32> {
        let mut v = vec![0.0f32; VECTOR_LEN];
        for k in 0..6 {
            v[DECK_TENSOR_LEN + k] = mine[k] as f32 / 18.0;
            v[DECK_TENSOR_LEN + 6 + k] = theirs[k] as f32 / 18.0;
        }
        v
    }

    #[test]
    fn even_position_is_a_coin_flip() {
        let est = HeuristicEstimator::default();
        let v = est.row_value(&row([3; 6], [3; 6]));
        assert!((v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn weakest_colour_dominates() {
        let est = HeuristicEstimator::default();
        // Higher total but a weaker minimum loses.
        let lopsided = est.row_value(&row([0, 5, 5, 5, 5, 5], [4, 4, 4, 4, 4, 4]));
        assert!(lopsided < 0.5);
        let ahead = est.row_value(&row([5, 5, 5, 5, 5, 5], [4, 4, 4, 4, 4, 4]));
        assert!(ahead > 0.5 && ahead < 1.0);
    }

    #[test]
    fn estimate_returns_one_value_per_row() {
        let mut vector = row([1; 6], [0; 6]);
        vector.extend(row([0; 6], [1; 6]));
        let input = ModelInput {
            batch: 2,
            grid: Vec::new(),
            vector,
        };
        let out = HeuristicEstimator::default().estimate(input.view()).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0] > 0.5);
        assert!(out[1] < 0.5);
    }
}
