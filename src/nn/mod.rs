//! Representation encoder.
//!
//! `encoding` turns game states and candidate batches into flat
//! [`Representation`] buffers; `input` reshapes those into the normalised
//! grid and vector tensors the value estimators consume.

pub mod encoding;
pub mod input;

pub use encoding::{encode_batched, encode_single, Representation};
pub use input::{
    build_inputs, build_inputs_rows, prepare_inputs, prepare_inputs_augmented, Augmentation,
    InputView, ModelInput, GRID_LEN, VECTOR_LEN,
};
