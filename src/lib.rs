//! # Grid regressions and small adversarial generators
//!
//! This crate fits linear models to a survey grid table and trains two small
//! generative adversarial networks with tch.
//!
//! ## Modules
//!
//! - `data`: Grid table loading, the synthetic sine set, scaling, batching
//!   and conversion to tensors
//! - `models`: Ordinary and non-negative least squares
//! - `model`: Toy GAN networks and the WGAN-GP critic/generator
//! - `training`: Training loops and loss functions
//! - `procedures`: The four runnable procedures behind the CLI
//! - `utils`: Configuration and SVG plots

pub mod data;
pub mod model;
pub mod models;
pub mod procedures;
pub mod training;
pub mod utils;

pub use data::{DataLoader, GridFrame, GridTable, MinMaxScaler, SineDataset};
pub use model::{Critic, Discriminator, Generator, SineGan, Wgan};
pub use models::{LinearRegression, NonNegativeLinearRegression};
pub use training::{GanTrainer, TrainingConfig, TrainingMetrics, WganTrainer, WganTrainingConfig};
pub use utils::Config;
