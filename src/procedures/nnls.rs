//! Non-negative fits of ARA, plain and with a depth·effort interaction

use std::fmt;

use anyhow::Context;
use ndarray::Array1;
use tracing::info;

use super::output_dir;
use crate::data::{GridFrame, GridTable};
use crate::models::NonNegativeLinearRegression;
use crate::utils::{plot_fit, plot_fit_3d, Config, NnlsConfig};

/// Both fits and the single prediction
#[derive(Debug, Clone)]
pub struct NnlsOutcome {
    /// Depth and effort coefficients
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    pub query_depth: f64,
    pub query_effort: f64,
    pub prediction: f64,
    /// Depth, effort and depth·effort coefficients
    pub interaction_coefficients: Array1<f64>,
    pub interaction_intercept: f64,
    /// In-sample predictions of the plain fit
    pub fitted: Array1<f64>,
    /// In-sample predictions of the interaction fit
    pub interaction_fitted: Array1<f64>,
}

impl fmt::Display for NnlsOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Depth coefficient: {:.8}", self.coefficients[0])?;
        writeln!(f, "Effort coefficient: {:.8}", self.coefficients[1])?;
        writeln!(f, "Intercept: {:.8}", self.intercept)?;
        writeln!(
            f,
            "Predicted ARA for depth={}, effort={}: {:.4}",
            self.query_depth, self.query_effort, self.prediction
        )?;
        writeln!(f, "With interaction term:")?;
        writeln!(f, "Depth coefficient: {:.8}", self.interaction_coefficients[0])?;
        writeln!(f, "Effort coefficient: {:.8}", self.interaction_coefficients[1])?;
        writeln!(f, "Interaction coefficient: {:.8}", self.interaction_coefficients[2])?;
        write!(f, "Intercept: {:.8}", self.interaction_intercept)
    }
}

/// Fit ARA on the complete rows, then predict at the configured query point
pub fn fit_nnls(frame: &GridFrame, settings: &NnlsConfig) -> anyhow::Result<NnlsOutcome> {
    info!("Fitting NNLS on {} complete rows", frame.len());

    let x = frame.features();
    let mut model = NonNegativeLinearRegression::new();
    model.fit(&x, frame.target())?;
    let coefficients = model.coefficients.clone().context("NNLS fit produced no coefficients")?;
    let prediction = model.predict_one(&[settings.query_depth, settings.query_effort])?;

    let x_interaction = frame.features_with_interaction();
    let mut interaction_model = NonNegativeLinearRegression::new();
    interaction_model.fit(&x_interaction, frame.target())?;
    let interaction_coefficients = interaction_model
        .coefficients
        .clone()
        .context("NNLS fit produced no coefficients")?;

    Ok(NnlsOutcome {
        coefficients,
        intercept: model.intercept.unwrap_or(f64::NAN),
        query_depth: settings.query_depth,
        query_effort: settings.query_effort,
        prediction,
        interaction_coefficients,
        interaction_intercept: interaction_model.intercept.unwrap_or(f64::NAN),
        fitted: model.predict(&x)?,
        interaction_fitted: interaction_model.predict(&x_interaction)?,
    })
}

/// Load the grid, fit both models, and plot the 2-D and 3-D views
pub fn run_nnls(config: &Config) -> anyhow::Result<NnlsOutcome> {
    let frame = GridTable::load_csv(&config.data.grid_csv)?.complete_cases()?;
    let outcome = fit_nnls(&frame, &config.nnls)?;

    let out = output_dir(config)?;
    let path = out.join("nnls_depth.svg");
    plot_fit(
        &path,
        "Non-negative Linear Regression",
        ("Depth", "ARA"),
        &frame.depth.to_vec(),
        &frame.ara.to_vec(),
        &outcome.fitted.to_vec(),
    )?;
    info!("Saved plot to {}", path.display());

    let points: Vec<(f64, f64, f64)> = frame
        .depth
        .iter()
        .zip(frame.effort.iter())
        .zip(outcome.interaction_fitted.iter())
        .map(|((&d, &e), &p)| (d, e, p))
        .collect();
    let path = out.join("nnls_interaction_3d.svg");
    plot_fit_3d(&path, "Predicted ARA by depth and effort", &points)?;
    info!("Saved plot to {}", path.display());
    Ok(outcome)
}
