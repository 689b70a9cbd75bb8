//! Data module for loading and preparing training data
//!
//! This module provides:
//! - The survey grid table (`depth`, `effort`, `ARA`) read from CSV
//! - The synthetic sine-curve sample set for the toy GAN
//! - Min-max scaling and CSV export of sample matrices
//! - DataLoader for shuffled mini-batches
//! - Conversion between sample matrices and tch tensors

mod convert;
mod grid;
mod loader;
mod preprocessing;
mod sine;

use thiserror::Error;

pub use convert::{to_array, to_tensor};
pub use grid::{GridFrame, GridRow, GridTable};
pub use loader::DataLoader;
pub use preprocessing::{save_samples_csv, MinMaxScaler};
pub use sine::SineDataset;

/// Errors raised while reading or writing tabular data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no complete rows for columns {columns:?}")]
    Empty { columns: Vec<&'static str> },

    #[error("expected {expected} column names, got {got}")]
    HeaderMismatch { expected: usize, got: usize },

    #[error("expected a 2-D tensor, got shape {0:?}")]
    TensorRank(Vec<i64>),

    #[error("tensor error: {0}")]
    Tensor(#[from] tch::TchError),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
