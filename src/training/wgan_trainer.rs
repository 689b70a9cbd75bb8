//! Training loop for the Wasserstein GAN with gradient penalty

use tracing::{debug, info};

use super::losses::{critic_loss, generator_loss_wasserstein, gradient_penalty};
use super::metrics::TrainingMetrics;
use super::trainer::progress_bar;
use crate::data::{to_tensor, DataLoader};
use crate::model::{ModelError, Wgan};

/// WGAN-GP training configuration
#[derive(Debug, Clone)]
pub struct WganTrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    /// Critic updates per generator update
    pub critic_iterations: usize,
    /// Weight of the gradient penalty
    pub lambda_gp: f64,
    /// Log losses every N epochs
    pub log_every: usize,
    pub show_progress: bool,
}

impl Default for WganTrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            learning_rate: 1e-4,
            beta1: 0.0,
            beta2: 0.9,
            critic_iterations: 5,
            lambda_gp: 10.0,
            log_every: 10,
            show_progress: true,
        }
    }
}

pub struct WganTrainer {
    config: WganTrainingConfig,
    metrics: TrainingMetrics,
}

impl WganTrainer {
    pub fn new(config: WganTrainingConfig) -> Self {
        Self {
            config,
            metrics: TrainingMetrics::new(),
        }
    }

    /// Train on batches of data scaled to `[0, 1]`
    ///
    /// The generator's batch norm needs at least two rows per batch in
    /// training mode, so loaders should drop a final single-row batch.
    pub fn train(&mut self, model: &Wgan, data_loader: &mut DataLoader) -> Result<&TrainingMetrics, ModelError> {
        let (lr, beta1, beta2) = (self.config.learning_rate, self.config.beta1, self.config.beta2);
        let mut gen_opt = model.gen_optimizer(lr, beta1, beta2)?;
        let mut critic_opt = model.critic_optimizer(lr, beta1, beta2)?;

        let batch_size = data_loader.batch_size();
        let log_every = self.config.log_every.max(1);
        info!(
            "Starting WGAN-GP training for {} epochs, {} batches per epoch, {} critic steps per batch",
            self.config.epochs,
            data_loader.num_batches(),
            self.config.critic_iterations
        );

        let pb = progress_bar(self.config.epochs, self.config.show_progress);

        for epoch in 0..self.config.epochs {
            let mut epoch_gen_loss = 0.0;
            let mut epoch_critic_loss = 0.0;
            let mut epoch_penalty = 0.0;
            let mut critic_steps = 0;
            let mut batch_count = 0;

            for (n, real_batch) in data_loader.iter().enumerate() {
                let batch = real_batch.nrows() as i64;
                let real = to_tensor(&real_batch, model.device);

                // ========== Train Critic ==========
                let mut last_critic_loss = f64::NAN;
                for _ in 0..self.config.critic_iterations {
                    let noise = model.generator.sample_noise(batch);
                    let fake = tch::no_grad(|| model.generator.forward(&noise, true))?;

                    let critic_real = model.critic.forward(&real)?;
                    let critic_fake = model.critic.forward(&fake)?;
                    let gp = gradient_penalty(&model.critic, &real, &fake)?;
                    let loss_critic = critic_loss(&critic_real, &critic_fake, &gp, self.config.lambda_gp);

                    critic_opt.zero_grad();
                    loss_critic.backward();
                    critic_opt.step();

                    last_critic_loss = f64::try_from(&loss_critic)?;
                    epoch_critic_loss += last_critic_loss;
                    epoch_penalty += f64::try_from(&gp)?;
                    critic_steps += 1;
                }

                // ========== Train Generator ==========
                let noise = model.generator.sample_noise(batch);
                let fake = model.generator.forward(&noise, true)?;
                let scores = model.critic.forward(&fake)?;
                let loss_gen = generator_loss_wasserstein(&scores);

                gen_opt.zero_grad();
                loss_gen.backward();
                gen_opt.step();

                let gen_value = f64::try_from(&loss_gen)?;
                epoch_gen_loss += gen_value;
                batch_count += 1;

                if epoch % log_every == 0 && n + 1 == batch_size {
                    info!("Epoch: {} Loss C.: {}", epoch, last_critic_loss);
                    info!("Epoch: {} Loss G.: {}", epoch, gen_value);
                }
            }

            let avg_gen_loss = epoch_gen_loss / batch_count.max(1) as f64;
            let avg_critic_loss = epoch_critic_loss / critic_steps.max(1) as f64;
            let avg_penalty = epoch_penalty / critic_steps.max(1) as f64;
            self.metrics
                .record_epoch(avg_gen_loss, avg_critic_loss, Some(avg_penalty));
            debug!(
                "Epoch {}: G={:.4} C={:.4} GP={:.4}",
                epoch, avg_gen_loss, avg_critic_loss, avg_penalty
            );

            pb.set_message(format!("G: {:.4}, C: {:.4}", avg_gen_loss, avg_critic_loss));
            pb.inc(1);
        }

        pb.finish_with_message("done");
        Ok(&self.metrics)
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &WganTrainingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MinMaxScaler, SineDataset};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tch::Device;

    #[test]
    fn test_short_wgan_run() {
        let mut rng = StdRng::seed_from_u64(11);
        let data = SineDataset::generate(24, &mut rng);
        let (scaled, _) = MinMaxScaler::fit_transform(&data.samples);
        let mut loader = DataLoader::new(scaled, 8, true, true, 11);

        let model = Wgan::new(2, 2, Device::Cpu);
        let mut trainer = WganTrainer::new(WganTrainingConfig {
            epochs: 1,
            critic_iterations: 2,
            show_progress: false,
            ..Default::default()
        });
        let metrics = trainer.train(&model, &mut loader).unwrap();

        assert_eq!(metrics.num_epochs(), 1);
        assert_eq!(metrics.gradient_penalties.len(), 1);
        assert!(metrics.gradient_penalties[0] >= 0.0);
        assert!(metrics.gen_losses[0].is_finite());
        assert!(metrics.disc_losses[0].is_finite());

        let samples = model.generator.generate_random(5).unwrap();
        assert!(samples.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_single_row_batch_is_an_error() {
        let mut rng = StdRng::seed_from_u64(12);
        let data = SineDataset::generate(5, &mut rng);
        let (scaled, _) = MinMaxScaler::fit_transform(&data.samples);
        // 5 rows in batches of 4 leave a trailing single row
        let mut loader = DataLoader::new(scaled, 4, false, false, 12);

        let model = Wgan::new(2, 2, Device::Cpu);
        let mut trainer = WganTrainer::new(WganTrainingConfig {
            epochs: 1,
            critic_iterations: 1,
            show_progress: false,
            ..Default::default()
        });
        let err = trainer.train(&model, &mut loader).unwrap_err();
        assert!(matches!(err, ModelError::BatchTooSmall { rows: 1 }));
    }
}
