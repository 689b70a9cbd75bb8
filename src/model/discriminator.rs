//! Discriminator network for the toy GAN
//!
//! Classifies 2-D points as real (on the sine curve) or fake.

use tch::{nn, nn::ModuleT, Tensor};

use super::{check_width, ModelError};

/// Discriminator network configuration
#[derive(Debug, Clone)]
pub struct DiscriminatorConfig {
    /// Number of input features per sample
    pub num_features: i64,
    /// Widths of the hidden layers
    pub hidden_sizes: Vec<i64>,
    /// Dropout rate after every hidden layer
    pub dropout: f64,
}

impl Default for DiscriminatorConfig {
    fn default() -> Self {
        Self {
            num_features: 2,
            hidden_sizes: vec![256, 128, 64],
            dropout: 0.3,
        }
    }
}

/// Discriminator network
///
/// Architecture:
/// 1. Hidden Linear layers, each followed by ReLU and Dropout
/// 2. Linear layer to a single unit with Sigmoid
#[derive(Debug)]
pub struct Discriminator {
    config: DiscriminatorConfig,
    net: nn::SequentialT,
}

impl Discriminator {
    pub fn new(vs: &nn::Path, config: DiscriminatorConfig) -> Self {
        let mut net = nn::seq_t();
        let mut width = config.num_features;
        for (i, &hidden) in config.hidden_sizes.iter().enumerate() {
            let dropout = config.dropout;
            net = net
                .add(nn::linear(vs / format!("fc{i}"), width, hidden, Default::default()))
                .add_fn(|x| x.relu())
                .add_fn_t(move |x, train| x.dropout(dropout, train));
            width = hidden;
        }
        let out = format!("fc{}", config.hidden_sizes.len());
        let net = net
            .add(nn::linear(vs / out, width, 1, Default::default()))
            .add_fn(|x| x.sigmoid());

        Self { config, net }
    }

    /// Probability that each row is real, shape (batch, 1)
    ///
    /// Dropout is only active when `train` is set.
    pub fn forward_t(&self, input: &Tensor, train: bool) -> Result<Tensor, ModelError> {
        check_width(input, self.config.num_features)?;
        Ok(self.net.forward_t(input, train))
    }

    pub fn config(&self) -> &DiscriminatorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    #[test]
    fn test_discriminator_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());

        let input = Tensor::randn([4, 2], (Kind::Float, Device::Cpu));
        let output = disc.forward_t(&input, false).unwrap();

        assert_eq!(output.size(), vec![4, 1]);
        let min_val = output.min().double_value(&[]);
        let max_val = output.max().double_value(&[]);
        assert!(min_val >= 0.0 && max_val <= 1.0);
    }

    #[test]
    fn test_discriminator_parameter_count() {
        let vs = VarStore::new(Device::Cpu);
        let _disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());
        // 4 linear layers with weight and bias each
        assert_eq!(vs.trainable_variables().len(), 8);
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());
        let input = Tensor::randn([8, 2], (Kind::Float, Device::Cpu));

        let first = disc.forward_t(&input, false).unwrap();
        let second = disc.forward_t(&input, false).unwrap();
        assert!(first.allclose(&second, 1e-6, 1e-6, false));
    }

    #[test]
    fn test_discriminator_rejects_wrong_width() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());
        let err = disc
            .forward_t(&Tensor::zeros([3, 5], (Kind::Float, Device::Cpu)), false)
            .unwrap_err();
        assert!(matches!(err, ModelError::FeatureMismatch { expected: 2, got: 5 }));
    }
}
