//! Model module containing the GAN architectures
//!
//! This module provides:
//! - Toy Generator / Discriminator pair for the sine-curve GAN
//! - Critic and Generator for the Wasserstein GAN with gradient penalty

mod discriminator;
mod gan;
mod generator;
pub mod wgan;

use tch::Tensor;
use thiserror::Error;

pub use discriminator::{Discriminator, DiscriminatorConfig};
pub use gan::SineGan;
pub use generator::{Generator, GeneratorConfig};
pub use wgan::{initialise_weights, Critic, Wgan};

/// Errors raised by the networks before a batch reaches libtorch
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("batch normalisation needs at least 2 rows in training mode, got {rows}")]
    BatchTooSmall { rows: i64 },

    #[error("real batch {real:?} and fake batch {fake:?} differ in shape")]
    BatchShapeMismatch { real: Vec<i64>, fake: Vec<i64> },

    #[error("expected {expected} input features, got {got}")]
    FeatureMismatch { expected: i64, got: i64 },

    #[error("tensor error: {0}")]
    Tensor(#[from] tch::TchError),
}

const LEAKY_SLOPE: f64 = 0.2;

/// LeakyReLU with slope 0.2, twice differentiable through autograd
pub(crate) fn leaky_relu(xs: &Tensor) -> Tensor {
    xs.maximum(&(xs * LEAKY_SLOPE))
}

/// Reject a batch whose width does not match the first layer
pub(crate) fn check_width(xs: &Tensor, expected: i64) -> Result<(), ModelError> {
    let got = xs.size().last().copied().unwrap_or(0);
    if got != expected {
        return Err(ModelError::FeatureMismatch { expected, got });
    }
    Ok(())
}
