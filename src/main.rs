//! Grid regressions and adversarial sample generators
//!
//! Main entry point providing CLI interface for:
//! - Least squares fit of a synthetic target on grid depth
//! - Non-negative fit of ARA on depth and effort
//! - Toy GAN on sine-curve points
//! - WGAN-GP on the sine points or the grid table

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rust_grid_gan::{
    procedures::{run_gan, run_linear, run_nnls, run_wgan, select_device},
    utils::{ensure_config_exists, Config, WganDataset},
};

/// Grid regressions and small adversarial generators
#[derive(Parser)]
#[command(name = "grid_gan")]
#[command(version = "0.1.0")]
#[command(about = "Fit linear models to a survey grid and train small GANs")]
struct Cli {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    /// Directory for plots and CSV output, overrides the configuration
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Train on the GPU when CUDA is available
    #[arg(long)]
    gpu: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetArg {
    Sine,
    Grid,
}

impl From<DatasetArg> for WganDataset {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::Sine => WganDataset::Sine,
            DatasetArg::Grid => WganDataset::Grid,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Least squares fit of y = 2·depth + sin(2·depth) + noise on depth
    Linear {
        /// Path to the grid CSV
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Seed for the target noise
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Non-negative fit of ARA on depth and effort, with and without interaction
    Nnls {
        /// Path to the grid CSV
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Depth of the single prediction
        #[arg(long)]
        depth: Option<f64>,

        /// Effort of the single prediction
        #[arg(long)]
        effort: Option<f64>,
    },

    /// Train the toy GAN on sine-curve points
    Gan {
        /// Number of epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Train the WGAN-GP
    Wgan {
        /// Number of epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        #[arg(short, long)]
        seed: Option<u64>,

        /// Training table
        #[arg(long, value_enum)]
        dataset: Option<DatasetArg>,

        /// Path to the grid CSV, used with `--dataset grid`
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Initialize default configuration file
    Init {
        /// Output configuration file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Init { output } = &cli.command {
        return init_config(output);
    }

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        info!("Config file {} not found, using defaults", cli.config.display());
        Config::default()
    };
    if let Some(dir) = cli.output_dir {
        config.output.dir = dir;
    }

    match cli.command {
        Commands::Linear { data, seed } => {
            if let Some(data) = data {
                config.data.grid_csv = data;
            }
            if let Some(seed) = seed {
                config.linear.seed = seed;
            }
            config.validate()?;
            println!("{}", run_linear(&config)?);
        }
        Commands::Nnls { data, depth, effort } => {
            if let Some(data) = data {
                config.data.grid_csv = data;
            }
            if let Some(depth) = depth {
                config.nnls.query_depth = depth;
            }
            if let Some(effort) = effort {
                config.nnls.query_effort = effort;
            }
            config.validate()?;
            println!("{}", run_nnls(&config)?);
        }
        Commands::Gan { epochs, seed } => {
            if let Some(epochs) = epochs {
                config.gan.epochs = epochs;
            }
            if let Some(seed) = seed {
                config.gan.seed = seed;
            }
            config.validate()?;
            run_gan(&config, select_device(cli.gpu))?;
        }
        Commands::Wgan {
            epochs,
            seed,
            dataset,
            data,
        } => {
            if let Some(epochs) = epochs {
                config.wgan.epochs = epochs;
            }
            if let Some(seed) = seed {
                config.wgan.seed = seed;
            }
            if let Some(dataset) = dataset {
                config.wgan.dataset = dataset.into();
            }
            if let Some(data) = data {
                config.data.grid_csv = data;
            }
            config.validate()?;
            run_wgan(&config, select_device(cli.gpu))?;
        }
        Commands::Init { .. } => {}
    }

    Ok(())
}

/// Initialize default configuration file
fn init_config(output_path: &Path) -> Result<()> {
    let existed = output_path.exists();
    ensure_config_exists(output_path)?;
    if existed {
        info!("Configuration already exists at {}", output_path.display());
    } else {
        info!("Created default configuration at {}", output_path.display());
    }
    Ok(())
}
