//! Training module for both GANs
//!
//! This module provides:
//! - Training loops for the toy GAN and the WGAN-GP
//! - Loss functions (binary cross-entropy, Wasserstein, gradient penalty)
//! - Per-epoch loss history

mod losses;
mod metrics;
mod trainer;
mod wgan_trainer;

pub use losses::{
    binary_cross_entropy, critic_loss, discriminator_loss, generator_loss, generator_loss_wasserstein,
    gradient_penalty,
};
pub use metrics::TrainingMetrics;
pub use trainer::{GanTrainer, TrainingConfig};
pub use wgan_trainer::{WganTrainer, WganTrainingConfig};
