//! Loss functions for GAN training
//!
//! Binary cross-entropy losses for the toy GAN, Wasserstein losses and the
//! gradient penalty for the WGAN-GP.

use tch::{Kind, Reduction, Tensor};

use crate::model::{Critic, ModelError};

/// Keeps the per-row gradient norm differentiable when a gradient is exactly zero
const NORM_EPS: f64 = 1e-12;

/// Mean binary cross-entropy of probabilities against a constant label
///
/// libtorch clamps each log term at -100, so saturated probabilities give a
/// finite loss.
pub fn binary_cross_entropy(probabilities: &Tensor, target: f64) -> Tensor {
    let targets = Tensor::full_like(probabilities, target);
    probabilities.binary_cross_entropy::<Tensor>(&targets, None, Reduction::Mean)
}

/// Generator loss: BCE of D(G(z)) against the "real" label
///
/// The generator wants the discriminator to output 1 for fake samples.
pub fn generator_loss(fake_output: &Tensor) -> Tensor {
    binary_cross_entropy(fake_output, 1.0)
}

/// Discriminator loss over the real and fake batches taken together
///
/// Real samples are labelled 1 and fake samples 0; the result is the mean
/// over all `n_real + n_fake` samples.
pub fn discriminator_loss(real_output: &Tensor, fake_output: &Tensor) -> Tensor {
    let outputs = Tensor::cat(&[real_output, fake_output], 0);
    let labels = Tensor::cat(&[real_output.ones_like(), fake_output.zeros_like()], 0);
    outputs.binary_cross_entropy::<Tensor>(&labels, None, Reduction::Mean)
}

/// Wasserstein loss for the generator
///
/// Generator loss: -E[C(G(z))]
pub fn generator_loss_wasserstein(fake_scores: &Tensor) -> Tensor {
    -fake_scores.mean(Kind::Float)
}

/// Wasserstein loss for the critic with gradient penalty
///
/// Critic loss: E[C(G(z))] - E[C(x)] + λ·GP
pub fn critic_loss(real_scores: &Tensor, fake_scores: &Tensor, gradient_penalty: &Tensor, lambda_gp: f64) -> Tensor {
    fake_scores.mean(Kind::Float) - real_scores.mean(Kind::Float) + gradient_penalty * lambda_gp
}

/// Gradient penalty on random interpolates of real and fake samples
///
/// For each row an ε ~ U[0, 1) mixes `real·ε + fake·(1 - ε)`. The critic's
/// scores are differentiated with respect to the mixed inputs with the
/// graph kept, so the returned penalty `mean((‖∇‖₂ - 1)²)` can itself be
/// backpropagated into the critic parameters. A row whose gradient is zero
/// contributes 1 and a zero subgradient.
pub fn gradient_penalty(critic: &Critic, real: &Tensor, fake: &Tensor) -> Result<Tensor, ModelError> {
    let (real_size, fake_size) = (real.size(), fake.size());
    if real_size != fake_size || real_size.len() != 2 {
        return Err(ModelError::BatchShapeMismatch {
            real: real_size,
            fake: fake_size,
        });
    }

    let (batch, features) = (real_size[0], real_size[1]);
    let epsilon = Tensor::rand([batch, 1], (Kind::Float, real.device())).repeat([1, features]);
    let complement = epsilon.ones_like() - &epsilon;
    let interpolated = (real * &epsilon + fake * complement)
        .detach()
        .set_requires_grad(true);

    let mixed_scores = critic.forward(&interpolated)?;
    // Summing the scores seeds every row's gradient with one
    let gradient = Tensor::run_backward(&[mixed_scores.sum(Kind::Float)], &[&interpolated], true, true)
        .pop()
        .unwrap_or_else(|| interpolated.zeros_like());

    let gradient_norm = (gradient.square().sum_dim_intlist(-1, false, Kind::Float) + NORM_EPS).sqrt();
    Ok((gradient_norm - 1.0).square().mean(Kind::Float))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tch::{nn::VarStore, Device};

    fn column(values: &[f64]) -> Tensor {
        Tensor::from_slice(values).to_kind(Kind::Float).reshape([-1, 1])
    }

    fn randn(rows: i64, cols: i64) -> Tensor {
        Tensor::randn([rows, cols], (Kind::Float, Device::Cpu))
    }

    #[test]
    fn test_bce_matches_formula() {
        let p = column(&[0.8, 0.4]);
        let expected = -((0.8f64).ln() + (0.4f64).ln()) / 2.0;
        assert_relative_eq!(binary_cross_entropy(&p, 1.0).double_value(&[]), expected, epsilon = 1e-6);

        let expected = -((0.2f64).ln() + (0.6f64).ln()) / 2.0;
        assert_relative_eq!(binary_cross_entropy(&p, 0.0).double_value(&[]), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_bce_is_bounded_at_saturation() {
        let p = column(&[0.0, 1.0]);
        let loss = binary_cross_entropy(&p, 1.0).double_value(&[]);
        assert!(loss.is_finite());
        assert_relative_eq!(loss, 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_discriminator_loss_weights_by_count() {
        let real = column(&[0.9, 0.7]);
        let fake = column(&[0.2]);
        let expected = -((0.9f64).ln() + (0.7f64).ln() + (0.8f64).ln()) / 3.0;
        assert_relative_eq!(discriminator_loss(&real, &fake).double_value(&[]), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_perfect_discriminator() {
        let real = column(&[0.999; 4]);
        let fake = column(&[0.001; 4]);
        assert!(discriminator_loss(&real, &fake).double_value(&[]) < 0.01);
        assert!(generator_loss(&fake).double_value(&[]) > 5.0);
    }

    #[test]
    fn test_wasserstein_losses() {
        let real = column(&[1.0, 3.0]);
        let fake = column(&[-1.0, 0.0]);
        let gp = Tensor::from(0.5f32);

        assert_relative_eq!(generator_loss_wasserstein(&fake).double_value(&[]), 0.5);
        assert_relative_eq!(
            critic_loss(&real, &fake, &gp, 10.0).double_value(&[]),
            -0.5 - 2.0 + 5.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_gradient_penalty_non_negative() {
        let vs = VarStore::new(Device::Cpu);
        let critic = Critic::new(&vs.root(), 3, 1);

        for _ in 0..3 {
            let gp = gradient_penalty(&critic, &randn(6, 3), &randn(6, 3)).unwrap();
            assert!(gp.size().is_empty());
            let value = gp.double_value(&[]);
            assert!(value >= 0.0 && value.is_finite());
        }
    }

    #[test]
    fn test_gradient_penalty_reaches_critic_parameters() {
        let vs = VarStore::new(Device::Cpu);
        let critic = Critic::new(&vs.root(), 2, 1);

        let gp = gradient_penalty(&critic, &randn(4, 2), &randn(4, 2)).unwrap();
        gp.backward();

        let touched = vs
            .trainable_variables()
            .iter()
            .any(|p| p.grad().defined() && p.grad().abs().sum(Kind::Float).double_value(&[]) > 0.0);
        assert!(touched);
    }

    #[test]
    fn test_zero_gradient_keeps_parameters_finite() {
        let vs = VarStore::new(Device::Cpu);
        let critic = Critic::new(&vs.root(), 2, 1);
        // A zero first layer makes the scores constant in the inputs
        tch::no_grad(|| {
            for (name, mut var) in vs.variables() {
                if name == "block0.linear.weight" {
                    let _ = var.zero_();
                }
            }
        });

        let gp = gradient_penalty(&critic, &randn(4, 2), &randn(4, 2)).unwrap();
        assert_relative_eq!(gp.double_value(&[]), 1.0, epsilon = 1e-5);
        gp.backward();

        for p in vs.trainable_variables() {
            let grad = p.grad();
            if grad.defined() {
                assert_eq!(grad.isnan().any().int64_value(&[]), 0);
            }
        }
    }

    #[test]
    fn test_gradient_penalty_shape_mismatch() {
        let vs = VarStore::new(Device::Cpu);
        let critic = Critic::new(&vs.root(), 2, 1);
        let err = gradient_penalty(&critic, &randn(4, 2), &randn(3, 2)).unwrap_err();
        assert!(matches!(
            err,
            ModelError::BatchShapeMismatch { real, fake } if real == vec![4, 2] && fake == vec![3, 2]
        ));
    }
}
