//! ONNX value estimator.
//!
//! Loads a value network exported with two inputs, `grid` [N, 10, 11, 21]
//! and `vector` [N, 29], and one output of N values (or [N, 1]). Inference
//! runs on the `ort` crate and is only compiled with the `neural` feature.

use std::path::Path;
use std::sync::Mutex;

use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use tracing::info;

use crate::nn::input::{GRID_CHANNELS, GRID_COLS, GRID_ROWS};
use crate::nn::{InputView, VECTOR_LEN};

use super::estimator::{EstimatorError, ValueEstimator};

/// Threads ONNX Runtime may use inside one operator.
const INTRA_THREADS: usize = 4;

/// Value network held in an ONNX Runtime session.
pub struct OnnxEstimator {
    session: Mutex<Session>,
}

impl OnnxEstimator {
    /// Loads and optimises the model at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EstimatorError> {
        let path = path.as_ref();
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(INTRA_THREADS))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| EstimatorError::ModelLoad(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "loaded ONNX value model");
        Ok(OnnxEstimator {
            session: Mutex::new(session),
        })
    }
}

impl ValueEstimator for OnnxEstimator {
    fn estimate(&self, input: InputView<'_>) -> Result<Vec<f32>, EstimatorError> {
        let n = input.batch;
        if n == 0 {
            return Ok(Vec::new());
        }

        let grid = Value::from_array((
            [n, GRID_CHANNELS, GRID_ROWS, GRID_COLS],
            input.grid.to_vec(),
        ))
        .map_err(|e| EstimatorError::Inference(e.to_string()))?;
        let vector = Value::from_array(([n, VECTOR_LEN], input.vector.to_vec()))
            .map_err(|e| EstimatorError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| EstimatorError::Inference("session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![grid, vector])
            .map_err(|e| EstimatorError::Inference(e.to_string()))?;
        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EstimatorError::Inference(e.to_string()))?;

        Ok(data.to_vec())
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_a_load_error() {
        match OnnxEstimator::load("/nonexistent/value.onnx") {
            Err(EstimatorError::ModelLoad(msg)) => assert!(msg.contains("value.onnx")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("loading a missing model must fail"),
        }
    }
}
