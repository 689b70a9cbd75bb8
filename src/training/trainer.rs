//! Training loop for the toy sine GAN
//!
//! Alternates one discriminator step and one generator step per batch, both
//! with binary cross-entropy losses.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::losses::{discriminator_loss, generator_loss};
use super::metrics::TrainingMetrics;
use crate::data::{to_tensor, DataLoader};
use crate::model::{ModelError, SineGan};

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Adam learning rate for both networks
    pub learning_rate: f64,
    /// Log losses every N epochs
    pub log_every: usize,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 300,
            learning_rate: 0.001,
            log_every: 10,
            show_progress: true,
        }
    }
}

pub(crate) fn progress_bar(epochs: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(epochs as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}") {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

/// Toy GAN trainer
pub struct GanTrainer {
    config: TrainingConfig,
    metrics: TrainingMetrics,
}

impl GanTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            metrics: TrainingMetrics::new(),
        }
    }

    /// Train the generator/discriminator pair on the batches of `data_loader`
    ///
    /// Fake samples for the discriminator step are produced without a graph,
    /// so that step only updates the discriminator. The generator step
    /// re-samples noise and backpropagates through the discriminator into
    /// the generator, whose optimizer is the only one stepped.
    pub fn train(&mut self, model: &SineGan, data_loader: &mut DataLoader) -> Result<&TrainingMetrics, ModelError> {
        let mut gen_opt = model.gen_optimizer(self.config.learning_rate)?;
        let mut disc_opt = model.disc_optimizer(self.config.learning_rate)?;

        let batch_size = data_loader.batch_size();
        let log_every = self.config.log_every.max(1);
        info!(
            "Starting GAN training for {} epochs, {} batches per epoch",
            self.config.epochs,
            data_loader.num_batches()
        );

        let pb = progress_bar(self.config.epochs, self.config.show_progress);

        for epoch in 0..self.config.epochs {
            let mut epoch_gen_loss = 0.0;
            let mut epoch_disc_loss = 0.0;
            let mut batch_count = 0;

            for (n, real_batch) in data_loader.iter().enumerate() {
                let batch = real_batch.nrows() as i64;
                let real_data = to_tensor(&real_batch, model.device);

                // ========== Train Discriminator ==========
                let noise = model.generator.sample_noise(batch);
                let fake_data = tch::no_grad(|| model.generator.forward(&noise))?;

                let real_output = model.discriminator.forward_t(&real_data, true)?;
                let fake_output = model.discriminator.forward_t(&fake_data, true)?;
                let d_loss = discriminator_loss(&real_output, &fake_output);

                disc_opt.zero_grad();
                d_loss.backward();
                disc_opt.step();

                // ========== Train Generator ==========
                let noise = model.generator.sample_noise(batch);
                let fake_data = model.generator.forward(&noise)?;
                let fake_output = model.discriminator.forward_t(&fake_data, true)?;
                let g_loss = generator_loss(&fake_output);

                gen_opt.zero_grad();
                g_loss.backward();
                gen_opt.step();

                let (d_value, g_value) = (f64::try_from(&d_loss)?, f64::try_from(&g_loss)?);
                epoch_disc_loss += d_value;
                epoch_gen_loss += g_value;
                batch_count += 1;

                if epoch % log_every == 0 && n + 1 == batch_size {
                    info!("Epoch: {} Loss D.: {}", epoch, d_value);
                    info!("Epoch: {} Loss G.: {}", epoch, g_value);
                }
            }

            let batches = batch_count.max(1) as f64;
            let avg_gen_loss = epoch_gen_loss / batches;
            let avg_disc_loss = epoch_disc_loss / batches;
            self.metrics.record_epoch(avg_gen_loss, avg_disc_loss, None);

            pb.set_message(format!("G: {:.4}, D: {:.4}", avg_gen_loss, avg_disc_loss));
            pb.inc(1);
        }

        pb.finish_with_message("done");
        Ok(&self.metrics)
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SineDataset;
    use crate::model::{DiscriminatorConfig, GeneratorConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tch::{Device, Tensor};

    #[test]
    fn test_training_config_default() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 300);
        assert_eq!(config.log_every, 10);
    }

    #[test]
    fn test_short_training_run() {
        let mut rng = StdRng::seed_from_u64(111);
        let data = SineDataset::generate(64, &mut rng);
        let mut loader = DataLoader::new(data.samples, 16, true, false, 111);

        let model = SineGan::new(GeneratorConfig::default(), DiscriminatorConfig::default(), Device::Cpu);
        let first_weight = |gan: &SineGan| -> Tensor { gan.gen_vs.variables()["fc0.weight"].copy() };
        let before = first_weight(&model);

        let mut trainer = GanTrainer::new(TrainingConfig {
            epochs: 2,
            show_progress: false,
            ..Default::default()
        });
        let metrics = trainer.train(&model, &mut loader).unwrap();

        assert_eq!(metrics.num_epochs(), 2);
        assert!(metrics.gen_losses.iter().all(|l| l.is_finite()));
        assert!(metrics.disc_losses.iter().all(|l| l.is_finite() && *l > 0.0));
        assert!(!first_weight(&model).equal(&before));
    }
}
