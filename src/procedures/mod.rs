//! The four runnable procedures behind the CLI subcommands
//!
//! Each `run_*` function loads its data, fits or trains, writes its plots
//! and CSV files into the configured output directory and returns what it
//! computed. The `fit_*` / `train_*` halves do the same work without
//! touching the file system.

mod gan;
mod linear;
mod nnls;
mod wgan;

use std::path::Path;

use anyhow::Context;
use ndarray::Array2;
use tch::Device;
use tracing::info;

use crate::data::save_samples_csv;
use crate::training::TrainingMetrics;
use crate::utils::{plot_losses, plot_samples, Config};

pub use gan::{run_gan, train_gan, GanOutcome};
pub use linear::{fit_linear, run_linear, synthetic_target, LinearOutcome};
pub use nnls::{fit_nnls, run_nnls, NnlsOutcome};
pub use wgan::{run_wgan, train_wgan, wgan_loader, WganOutcome};

/// CUDA when asked for and present, CPU otherwise
pub fn select_device(gpu: bool) -> Device {
    if gpu && tch::Cuda::is_available() {
        info!("Using CUDA GPU");
        Device::Cuda(0)
    } else {
        info!("Using CPU");
        Device::Cpu
    }
}

/// The output directory, created on first use
pub fn output_dir(config: &Config) -> anyhow::Result<&Path> {
    let dir = config.output.dir.as_path();
    std::fs::create_dir_all(dir).with_context(|| format!("creating output directory {}", dir.display()))?;
    Ok(dir)
}

/// Generated samples and loss history of a GAN run
pub(crate) fn save_run_outputs(
    out: &Path,
    prefix: &str,
    headers: &[&str],
    real: &Array2<f64>,
    generated: &Array2<f64>,
    metrics: &TrainingMetrics,
) -> anyhow::Result<()> {
    let samples_path = out.join(format!("{prefix}_samples.csv"));
    save_samples_csv(&samples_path, headers, generated)?;
    info!("Saved generated samples to {}", samples_path.display());

    let losses_path = out.join(format!("{prefix}_losses.csv"));
    metrics.save_csv(&losses_path)?;

    let title = format!("{} samples", prefix.to_uppercase());
    plot_samples(
        &out.join(format!("{prefix}_samples.svg")),
        &title,
        (headers[0], headers[1]),
        real,
        generated,
    )?;
    plot_losses(&out.join(format!("{prefix}_losses.svg")), "Training losses", metrics)?;
    Ok(())
}
