//! Critic and generator for the Wasserstein GAN with gradient penalty
//!
//! Both networks are stacks of `block`s (Linear, normalisation, LeakyReLU).
//! The critic normalises each sample over its own features, so its scores
//! and hence the gradient penalty stay independent across the batch. The
//! generator uses batch normalisation and ends in a sigmoid, so it produces
//! data scaled to `[0, 1]`.

use ndarray::Array2;
use tch::{nn, nn::Module, nn::ModuleT, nn::OptimizerConfig, nn::VarStore, Device, Kind, TchError, Tensor};

use super::{check_width, leaky_relu, ModelError};
use crate::data::{to_array, DataError};

/// Scores samples with an unbounded realness value
#[derive(Debug)]
pub struct Critic {
    feature_dimension: i64,
    net: nn::Sequential,
}

impl Critic {
    /// `feature_dimension -> 100 -> 150 -> output_dim`
    pub fn new(vs: &nn::Path, feature_dimension: i64, output_dim: i64) -> Self {
        let net = nn::seq()
            .add(Self::block(&(vs / "block0"), feature_dimension, 100))
            .add(Self::block(&(vs / "block1"), 100, 150))
            .add(nn::linear(vs / "linear", 150, output_dim, Default::default()));

        Self {
            feature_dimension,
            net,
        }
    }

    /// Linear, per-sample normalisation without affine, LeakyReLU(0.2)
    ///
    /// On a (batch, nodes) input this is what an instance norm does to an
    /// unbatched signal: every row is centred and scaled over its nodes.
    pub fn block(vs: &nn::Path, in_features: i64, out_features: i64) -> nn::Sequential {
        let norm = nn::LayerNormConfig {
            elementwise_affine: false,
            ..Default::default()
        };
        nn::seq()
            .add(nn::linear(vs / "linear", in_features, out_features, Default::default()))
            .add(nn::layer_norm(vs / "norm", vec![out_features], norm))
            .add_fn(leaky_relu)
    }

    /// Scores of shape (batch, output_dim)
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor, ModelError> {
        check_width(xs, self.feature_dimension)?;
        Ok(self.net.forward(xs))
    }

    pub fn feature_dimension(&self) -> i64 {
        self.feature_dimension
    }
}

/// Maps latent noise to samples in `[0, 1]^feature_dimension`
#[derive(Debug)]
pub struct Generator {
    feature_dimension: i64,
    latent_dimension: i64,
    device: Device,
    net: nn::SequentialT,
}

impl Generator {
    /// `latent_dimension -> 150 -> 100 -> feature_dimension`, then Sigmoid
    pub fn new(vs: &nn::Path, feature_dimension: i64, latent_dimension: i64) -> Self {
        let net = nn::seq_t()
            .add(Self::block(&(vs / "block0"), latent_dimension, 150))
            .add(Self::block(&(vs / "block1"), 150, 100))
            .add(nn::linear(vs / "linear", 100, feature_dimension, Default::default()))
            .add_fn(|x| x.sigmoid());

        Self {
            feature_dimension,
            latent_dimension,
            device: vs.device(),
            net,
        }
    }

    /// Linear, BatchNorm1d, LeakyReLU(0.2)
    pub fn block(vs: &nn::Path, in_features: i64, out_features: i64) -> nn::SequentialT {
        nn::seq_t()
            .add(nn::linear(vs / "linear", in_features, out_features, Default::default()))
            .add(nn::batch_norm1d(vs / "norm", out_features, Default::default()))
            .add_fn(leaky_relu)
    }

    /// Batch statistics when `train` is set, running statistics otherwise
    pub fn forward(&self, noise: &Tensor, train: bool) -> Result<Tensor, ModelError> {
        check_width(noise, self.latent_dimension)?;
        let rows = noise.size()[0];
        if train && rows < 2 {
            return Err(ModelError::BatchTooSmall { rows });
        }
        Ok(self.net.forward_t(noise, train))
    }

    /// Standard normal latent batch, shape (num_samples, latent_dimension)
    pub fn sample_noise(&self, num_samples: i64) -> Tensor {
        Tensor::randn([num_samples, self.latent_dimension], (Kind::Float, self.device))
    }

    /// Draw samples in evaluation mode, using the running batch-norm statistics
    pub fn generate_random(&self, num_samples: i64) -> Result<Array2<f64>, DataError> {
        let noise = self.sample_noise(num_samples);
        let samples = tch::no_grad(|| self.net.forward_t(&noise, false));
        to_array(&samples)
    }

    pub fn feature_dimension(&self) -> i64 {
        self.feature_dimension
    }

    pub fn latent_dimension(&self) -> i64 {
        self.latent_dimension
    }
}

/// Critic/generator pair with one variable store each, weights initialised
pub struct Wgan {
    pub generator: Generator,
    pub critic: Critic,
    pub gen_vs: VarStore,
    pub critic_vs: VarStore,
    pub device: Device,
}

impl Wgan {
    pub fn new(feature_dimension: i64, latent_dimension: i64, device: Device) -> Self {
        let gen_vs = VarStore::new(device);
        let critic_vs = VarStore::new(device);

        let generator = Generator::new(&gen_vs.root(), feature_dimension, latent_dimension);
        let critic = Critic::new(&critic_vs.root(), feature_dimension, 1);
        initialise_weights(&gen_vs);
        initialise_weights(&critic_vs);

        Self {
            generator,
            critic,
            gen_vs,
            critic_vs,
            device,
        }
    }

    pub fn gen_optimizer(&self, lr: f64, beta1: f64, beta2: f64) -> Result<nn::Optimizer, TchError> {
        adam(beta1, beta2).build(&self.gen_vs, lr)
    }

    pub fn critic_optimizer(&self, lr: f64, beta1: f64, beta2: f64) -> Result<nn::Optimizer, TchError> {
        adam(beta1, beta2).build(&self.critic_vs, lr)
    }
}

fn adam(beta1: f64, beta2: f64) -> nn::Adam {
    nn::Adam {
        beta1,
        beta2,
        ..Default::default()
    }
}

/// Draw every linear weight matrix in `vs` from N(0, 0.02)
///
/// Biases and normalisation parameters keep their values.
pub fn initialise_weights(vs: &VarStore) {
    tch::no_grad(|| {
        for (name, mut var) in vs.variables() {
            if name.ends_with("linear.weight") {
                let _ = var.normal_(0.0, 0.02);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn randn(rows: i64, cols: i64) -> Tensor {
        Tensor::randn([rows, cols], (Kind::Float, Device::Cpu))
    }

    #[test]
    fn test_critic_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let critic = Critic::new(&vs.root(), 3, 1);

        let scores = critic.forward(&randn(8, 3)).unwrap();
        assert_eq!(scores.size(), vec![8, 1]);
    }

    #[test]
    fn test_critic_scores_are_per_sample() {
        // A row's score must not depend on the rest of its batch
        let vs = VarStore::new(Device::Cpu);
        let critic = Critic::new(&vs.root(), 2, 1);
        let batch = randn(5, 2);

        let all = critic.forward(&batch).unwrap();
        let first = critic.forward(&batch.narrow(0, 0, 1)).unwrap();
        assert!((all.double_value(&[0, 0]) - first.double_value(&[0, 0])).abs() < 1e-5);
    }

    #[test]
    fn test_critic_has_no_norm_parameters() {
        let vs = VarStore::new(Device::Cpu);
        let _critic = Critic::new(&vs.root(), 2, 1);
        let names = vs.variables();
        assert_eq!(names.len(), 6);
        assert!(names.keys().all(|name| name.contains("linear")));
    }

    #[test]
    fn test_generator_runs_in_unit_range() {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator::new(&vs.root(), 3, 2);
        initialise_weights(&vs);

        let out = gen.forward(&gen.sample_noise(16), true).unwrap();
        assert_eq!(out.size(), vec![16, 3]);
        assert!(out.min().double_value(&[]) >= 0.0);
        assert!(out.max().double_value(&[]) <= 1.0);

        let sampled = gen.generate_random(4).unwrap();
        assert_eq!(sampled.dim(), (4, 3));
        assert!(sampled.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_generator_training_needs_two_rows() {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator::new(&vs.root(), 2, 2);
        let noise = gen.sample_noise(1);
        assert!(matches!(
            gen.forward(&noise, true),
            Err(ModelError::BatchTooSmall { rows: 1 })
        ));
        assert!(gen.forward(&noise, false).is_ok());
    }

    #[test]
    fn test_initialise_weights_small_std() {
        let vs = VarStore::new(Device::Cpu);
        let _critic = Critic::new(&vs.root(), 2, 1);
        initialise_weights(&vs);

        let weights: Vec<Tensor> = vs
            .variables()
            .into_iter()
            .filter(|(name, _)| name.ends_with("weight"))
            .map(|(_, w)| w.flatten(0, -1))
            .collect();
        assert_eq!(weights.len(), 3);
        let std = Tensor::cat(&weights, 0).std(true).double_value(&[]);
        assert!((std - 0.02).abs() < 0.003);
    }

    #[test]
    fn test_wgan_pair_builds_optimizers() {
        let wgan = Wgan::new(3, 2, Device::Cpu);
        assert_eq!(wgan.critic.feature_dimension(), 3);
        assert_eq!(wgan.generator.latent_dimension(), 2);
        assert!(wgan.gen_optimizer(1e-4, 0.0, 0.9).is_ok());
        assert!(wgan.critic_optimizer(1e-4, 0.0, 0.9).is_ok());
    }

    #[test]
    fn test_initialise_weights_skips_batch_norm() {
        let vs = VarStore::new(Device::Cpu);
        let _gen = Generator::new(&vs.root(), 2, 2);
        initialise_weights(&vs);

        let gammas: Vec<Tensor> = vs
            .variables()
            .into_iter()
            .filter(|(name, _)| name.ends_with("norm.weight"))
            .map(|(_, w)| w)
            .collect();
        assert_eq!(gammas.len(), 2);
        for gamma in gammas {
            assert!(gamma.allclose(&gamma.ones_like(), 1e-6, 1e-6, false));
        }
    }
}
