//! Value estimation.
//!
//! The [`ValueEstimator`] trait is the only seam between search and any
//! learned model. [`HeuristicEstimator`] is always available; the ONNX
//! estimator requires the `neural` feature.

pub mod estimator;
pub mod heuristic;
#[cfg(feature = "neural")]
pub mod neural;

pub use estimator::{predict, EstimatorError, ValueEstimator};
pub use heuristic::HeuristicEstimator;
#[cfg(feature = "neural")]
pub use neural::OnnxEstimator;
