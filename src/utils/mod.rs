//! Utility module with helper functions
//!
//! This module provides:
//! - Configuration handling
//! - SVG charts

mod config;
mod plot;

pub use config::{
    ensure_config_exists, Config, DataConfig, GanConfig, LinearConfig, NnlsConfig, OutputConfig, WganConfig,
    WganDataset,
};
pub use plot::{plot_fit, plot_fit_3d, plot_losses, plot_samples, viridis, PlotError};
