//! Configuration management
//!
//! One file configures every procedure: the input table, the two regression
//! fits, both GANs and where results are written.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::training::{TrainingConfig, WganTrainingConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub linear: LinearConfig,
    pub nnls: NnlsConfig,
    pub gan: GanConfig,
    pub wgan: WganConfig,
    pub output: OutputConfig,
}

/// Input data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV export of the survey grid with `depth`, `effort` and `ARA` columns
    pub grid_csv: PathBuf,
    /// Number of synthetic sine points
    pub num_sine_samples: usize,
}

/// Single-feature least squares on depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    pub seed: u64,
    /// Standard deviation of the Gaussian noise added to the target
    pub noise_std: f64,
}

/// Non-negative fit of ARA on depth and effort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NnlsConfig {
    pub query_depth: f64,
    pub query_effort: f64,
}

/// Toy sine GAN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GanConfig {
    pub seed: u64,
    pub batch_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub dropout: f64,
    pub log_every: usize,
    /// Samples drawn from the trained generator
    pub num_generated: usize,
}

/// Which table the WGAN learns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WganDataset {
    /// The synthetic sine points
    Sine,
    /// The complete `depth`, `effort`, `ARA` rows of the grid table
    Grid,
}

/// Wasserstein GAN with gradient penalty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WganConfig {
    pub seed: u64,
    pub dataset: WganDataset,
    pub batch_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub critic_iterations: usize,
    pub lambda_gp: f64,
    pub latent_dimension: usize,
    pub log_every: usize,
    pub num_generated: usize,
}

/// Where plots and CSV files go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub show_progress: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            grid_csv: PathBuf::from("data/grid.csv"),
            num_sine_samples: 1024,
        }
    }
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            noise_std: 0.2,
        }
    }
}

impl Default for NnlsConfig {
    fn default() -> Self {
        Self {
            query_depth: 644.0,
            query_effort: 30.925,
        }
    }
}

impl Default for GanConfig {
    fn default() -> Self {
        Self {
            seed: 111,
            batch_size: 32,
            epochs: 300,
            learning_rate: 0.001,
            dropout: 0.3,
            log_every: 10,
            num_generated: 100,
        }
    }
}

impl Default for WganConfig {
    fn default() -> Self {
        Self {
            seed: 111,
            dataset: WganDataset::Sine,
            batch_size: 32,
            epochs: 50,
            learning_rate: 1e-4,
            beta1: 0.0,
            beta2: 0.9,
            critic_iterations: 5,
            lambda_gp: 10.0,
            latent_dimension: 2,
            log_every: 10,
            num_generated: 100,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            show_progress: true,
        }
    }
}

impl GanConfig {
    pub fn training_config(&self, show_progress: bool) -> TrainingConfig {
        TrainingConfig {
            epochs: self.epochs,
            learning_rate: self.learning_rate,
            log_every: self.log_every,
            show_progress,
        }
    }
}

impl WganConfig {
    pub fn training_config(&self, show_progress: bool) -> WganTrainingConfig {
        WganTrainingConfig {
            epochs: self.epochs,
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            critic_iterations: self.critic_iterations,
            lambda_gp: self.lambda_gp,
            log_every: self.log_every,
            show_progress,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content).with_context(|| format!("writing {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content).with_context(|| format!("writing {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Load from TOML or JSON depending on the file extension
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if is_toml(path.as_ref()) {
            Self::from_toml(path)
        } else {
            Self::from_json(path)
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.data.num_sine_samples == 0 {
            anyhow::bail!("Number of sine samples must be > 0");
        }
        if self.linear.noise_std.is_nan() || self.linear.noise_std < 0.0 {
            anyhow::bail!("Noise standard deviation must be >= 0");
        }
        if self.gan.batch_size == 0 || self.wgan.batch_size == 0 {
            anyhow::bail!("Batch size must be > 0");
        }
        if self.wgan.batch_size < 2 {
            anyhow::bail!("WGAN batch size must be at least 2 for batch normalisation");
        }
        if self.gan.epochs == 0 || self.wgan.epochs == 0 {
            anyhow::bail!("Number of epochs must be > 0");
        }
        if !(0.0..1.0).contains(&self.gan.dropout) {
            anyhow::bail!("Dropout must be in [0, 1)");
        }
        if self.gan.learning_rate <= 0.0 || self.wgan.learning_rate <= 0.0 {
            anyhow::bail!("Learning rate must be > 0");
        }
        if !(0.0..1.0).contains(&self.wgan.beta1) || !(0.0..1.0).contains(&self.wgan.beta2) {
            anyhow::bail!("Adam betas must be in [0, 1)");
        }
        if self.wgan.critic_iterations == 0 {
            anyhow::bail!("Critic iterations must be > 0");
        }
        if self.wgan.lambda_gp < 0.0 {
            anyhow::bail!("Gradient penalty weight must be >= 0");
        }
        if self.wgan.latent_dimension == 0 {
            anyhow::bail!("Latent dimension must be > 0");
        }
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "toml")
}

/// Create default configuration file if it doesn't exist
pub fn ensure_config_exists<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    if path.exists() {
        Config::load(path)
    } else {
        let config = Config::default();
        if is_toml(path) {
            config.save_toml(path)?;
        } else {
            config.save_json(path)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.linear.seed, 42);
        assert_eq!(config.gan.seed, 111);
        assert_eq!(config.wgan.critic_iterations, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let loaded: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_config_toml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.wgan.dataset = WganDataset::Grid;
        config.save_toml(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"output": {{"dir": "elsewhere", "show_progress": false}}}}"#).unwrap();

        let config = Config::from_json(file.path()).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("elsewhere"));
        assert_eq!(config.gan, Config::default().gan);
    }

    #[test]
    fn test_partial_section_fills_missing_fields() {
        let config: Config = toml::from_str("[gan]\nepochs = 10\n\n[wgan]\ndataset = \"grid\"\n").unwrap();
        assert_eq!(config.gan.epochs, 10);
        assert_eq!(config.gan.seed, 111);
        assert_eq!(config.gan.batch_size, 32);
        assert_eq!(config.wgan.dataset, WganDataset::Grid);
        assert_eq!(config.wgan.critic_iterations, 5);
        assert_eq!(config.linear, LinearConfig::default());
        assert!(config.validate().is_ok());

        let config: Config = serde_json::from_str(r#"{"nnls": {"query_depth": 500.0}}"#).unwrap();
        assert_eq!(config.nnls.query_depth, 500.0);
        assert_eq!(config.nnls.query_effort, 30.925);
    }

    #[test]
    fn test_ensure_config_exists_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.json");

        let created = ensure_config_exists(&path).unwrap();
        assert!(path.exists());
        assert_eq!(ensure_config_exists(&path).unwrap(), created);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.wgan.batch_size = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.gan.dropout = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.wgan.critic_iterations = 0;
        assert!(config.validate().is_err());
    }
}
