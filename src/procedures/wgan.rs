//! WGAN-GP on data scaled to [0, 1]

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tch::Device;
use tracing::info;

use super::{output_dir, save_run_outputs};
use crate::data::{DataLoader, GridTable, MinMaxScaler, SineDataset};
use crate::model::Wgan;
use crate::training::{TrainingMetrics, WganTrainer};
use crate::utils::{Config, WganConfig, WganDataset};

/// Training data, generated samples on the data's scale and loss history
#[derive(Debug, Clone)]
pub struct WganOutcome {
    pub headers: Vec<&'static str>,
    pub real: Array2<f64>,
    pub generated: Array2<f64>,
    pub metrics: TrainingMetrics,
}

/// Shuffled batches that never end in a single row
///
/// Batch normalisation cannot train on one row, so the trailing batch is
/// dropped exactly when it would hold a single row.
pub fn wgan_loader(scaled: Array2<f64>, batch_size: usize, seed: u64) -> DataLoader {
    let drop_last = scaled.nrows() % batch_size.max(1) == 1;
    DataLoader::new(scaled, batch_size, true, drop_last, seed)
}

/// Train on `data` (rows are samples) and return samples on its scale
pub fn train_wgan(
    data: &Array2<f64>,
    settings: &WganConfig,
    show_progress: bool,
    device: Device,
) -> anyhow::Result<(Array2<f64>, TrainingMetrics)> {
    if data.nrows() < 2 {
        anyhow::bail!("WGAN training needs at least 2 rows, got {}", data.nrows());
    }
    tch::manual_seed(settings.seed as i64);

    let (scaled, scaler) = MinMaxScaler::fit_transform(data);
    let mut data_loader = wgan_loader(scaled, settings.batch_size, settings.seed);

    let model = Wgan::new(data.ncols() as i64, settings.latent_dimension as i64, device);
    let mut trainer = WganTrainer::new(settings.training_config(show_progress));
    trainer.train(&model, &mut data_loader)?;

    let generated = scaler.inverse_transform(&model.generator.generate_random(settings.num_generated as i64)?);
    info!("Generated {} samples of width {}", generated.nrows(), generated.ncols());
    Ok((generated, trainer.metrics().clone()))
}

/// Load the configured table, train, then write samples, losses and plots
pub fn run_wgan(config: &Config, device: Device) -> anyhow::Result<WganOutcome> {
    let settings = &config.wgan;
    let (real, headers) = match settings.dataset {
        WganDataset::Sine => {
            let mut rng = StdRng::seed_from_u64(settings.seed);
            (
                SineDataset::generate(config.data.num_sine_samples, &mut rng).samples,
                vec!["x", "y"],
            )
        }
        WganDataset::Grid => (
            GridTable::load_csv(&config.data.grid_csv)?.complete_cases()?.to_matrix(),
            vec!["depth", "effort", "ARA"],
        ),
    };

    let (generated, metrics) = train_wgan(&real, settings, config.output.show_progress, device)?;
    let out = output_dir(config)?;
    save_run_outputs(out, "wgan", &headers, &real, &generated, &metrics)?;

    Ok(WganOutcome {
        headers,
        real,
        generated,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_drops_only_a_single_trailing_row() {
        let loader = wgan_loader(Array2::zeros((33, 2)), 32, 0);
        assert_eq!(loader.num_batches(), 1);

        let loader = wgan_loader(Array2::zeros((34, 2)), 32, 0);
        assert_eq!(loader.num_batches(), 2);

        let loader = wgan_loader(Array2::zeros((64, 2)), 32, 0);
        assert_eq!(loader.num_batches(), 2);
    }

    #[test]
    fn test_too_few_rows() {
        let err = train_wgan(&Array2::zeros((1, 3)), &WganConfig::default(), false, Device::Cpu).unwrap_err();
        assert!(err.to_string().contains("at least 2 rows"));
    }
}
