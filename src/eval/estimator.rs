//! Value-estimator capability and the sub-batching glue around it.
//!
//! An estimator maps a batch of prepared inputs to one scalar per row: the
//! estimated chance that the row's mover goes on to win. [`predict`] splits
//! large batches into chunks no larger than the configured maximum and
//! concatenates the results in row order.

use thiserror::Error;

use crate::nn::{InputView, ModelInput};

/// Errors raised by estimators and the batching glue.
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("estimator returned {got} values for a batch of {expected}")]
    BatchMismatch { expected: usize, got: usize },

    #[error("max batch size must be at least 1")]
    InvalidBatchSize,
}

/// A learned or hand-written value function over prepared inputs.
///
/// Implementations must return exactly `input.batch` values, in row order.
pub trait ValueEstimator: Send + Sync {
    fn estimate(&self, input: InputView<'_>) -> Result<Vec<f32>, EstimatorError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "estimator"
    }
}

/// Runs the estimator over `input` in chunks of at most `max_batch` rows.
pub fn predict(
    estimator: &dyn ValueEstimator,
    input: &ModelInput,
    max_batch: usize,
) -> Result<Vec<f32>, EstimatorError> {
    if max_batch == 0 {
        return Err(EstimatorError::InvalidBatchSize);
    }
    let mut values = Vec::with_capacity(input.batch);
    for chunk in input.chunks(max_batch) {
        let out = estimator.estimate(chunk)?;
        if out.len() != chunk.batch {
            return Err(EstimatorError::BatchMismatch {
                expected: chunk.batch,
                got: out.len(),
            });
        }
        values.extend(out);
    }
    Ok(values)
}
