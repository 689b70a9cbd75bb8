//! Generator network for the toy GAN
//!
//! Maps 2-D latent noise to points meant to lie on the sine curve.

use ndarray::Array2;
use tch::{nn, nn::Module, Device, Kind, Tensor};

use super::{check_width, ModelError};
use crate::data::{to_array, DataError};

/// Generator network configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Size of the latent noise vector
    pub latent_dim: i64,
    /// Widths of the hidden layers
    pub hidden_sizes: Vec<i64>,
    /// Number of output features
    pub num_features: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            latent_dim: 2,
            hidden_sizes: vec![16, 32],
            num_features: 2,
        }
    }
}

/// Generator network
///
/// Hidden Linear layers with ReLU, then a linear output layer.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    device: Device,
    net: nn::Sequential,
}

impl Generator {
    pub fn new(vs: &nn::Path, config: GeneratorConfig) -> Self {
        let mut net = nn::seq();
        let mut width = config.latent_dim;
        for (i, &hidden) in config.hidden_sizes.iter().enumerate() {
            net = net
                .add(nn::linear(vs / format!("fc{i}"), width, hidden, Default::default()))
                .add_fn(|x| x.relu());
            width = hidden;
        }
        let out = format!("fc{}", config.hidden_sizes.len());
        let net = net.add(nn::linear(vs / out, width, config.num_features, Default::default()));

        Self {
            config,
            device: vs.device(),
            net,
        }
    }

    /// Generate samples from noise of shape (batch, latent_dim)
    pub fn forward(&self, noise: &Tensor) -> Result<Tensor, ModelError> {
        check_width(noise, self.config.latent_dim)?;
        Ok(self.net.forward(noise))
    }

    /// Standard normal latent vectors, shape (num_samples, latent_dim)
    pub fn sample_noise(&self, num_samples: i64) -> Tensor {
        Tensor::randn([num_samples, self.config.latent_dim], (Kind::Float, self.device))
    }

    /// Generate random samples without recording a graph
    pub fn generate_random(&self, num_samples: i64) -> Result<Array2<f64>, DataError> {
        let noise = self.sample_noise(num_samples);
        let samples = tch::no_grad(|| self.net.forward(&noise));
        to_array(&samples)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}
