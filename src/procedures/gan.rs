//! Toy GAN on sine-curve points

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tch::Device;
use tracing::info;

use super::{output_dir, save_run_outputs};
use crate::data::{DataLoader, SineDataset};
use crate::model::{DiscriminatorConfig, GeneratorConfig, SineGan};
use crate::training::{GanTrainer, TrainingMetrics};
use crate::utils::Config;

/// Training data, generated samples and loss history of one run
#[derive(Debug, Clone)]
pub struct GanOutcome {
    pub real: Array2<f64>,
    pub generated: Array2<f64>,
    pub metrics: TrainingMetrics,
}

/// Train on a fresh sine set and sample the generator
pub fn train_gan(config: &Config, device: Device) -> anyhow::Result<GanOutcome> {
    let settings = &config.gan;
    tch::manual_seed(settings.seed as i64);
    let mut rng = StdRng::seed_from_u64(settings.seed);

    let data = SineDataset::generate(config.data.num_sine_samples, &mut rng);
    let mut data_loader = DataLoader::new(data.samples.clone(), settings.batch_size, true, false, settings.seed);

    let disc_config = DiscriminatorConfig {
        dropout: settings.dropout,
        ..Default::default()
    };
    let model = SineGan::new(GeneratorConfig::default(), disc_config, device);

    let mut trainer = GanTrainer::new(settings.training_config(config.output.show_progress));
    trainer.train(&model, &mut data_loader)?;

    let generated = model.generator.generate_random(settings.num_generated as i64)?;
    info!("Generated {} samples of width {}", generated.nrows(), generated.ncols());

    Ok(GanOutcome {
        real: data.samples,
        generated,
        metrics: trainer.metrics().clone(),
    })
}

/// Train, then write samples, losses and their plots
pub fn run_gan(config: &Config, device: Device) -> anyhow::Result<GanOutcome> {
    let outcome = train_gan(config, device)?;
    let out = output_dir(config)?;
    save_run_outputs(out, "gan", &["x", "y"], &outcome.real, &outcome.generated, &outcome.metrics)?;
    Ok(outcome)
}
