//! Least squares on grid depth against a seeded synthetic target

use std::fmt;

use ndarray::{Array1, Axis};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Normal;
use tracing::info;

use super::output_dir;
use crate::data::GridTable;
use crate::models::LinearRegression;
use crate::utils::{plot_fit, Config, LinearConfig};

/// Coefficients and series of one linear fit
#[derive(Debug, Clone)]
pub struct LinearOutcome {
    pub depth: Array1<f64>,
    pub target: Array1<f64>,
    pub fitted: Array1<f64>,
    pub intercept: f64,
    pub coefficient: f64,
    pub r_squared: f64,
}

impl fmt::Display for LinearOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Intercept: {:.4}", self.intercept)?;
        writeln!(f, "Coefficient: {:.4}", self.coefficient)?;
        write!(f, "R-squared: {:.4}", self.r_squared)
    }
}

/// `y = 2·depth + sin(2·depth) + N(0, noise_std)`
///
/// The generator is seeded before the noise is drawn, so a given seed always
/// yields the same target.
pub fn synthetic_target(depth: &Array1<f64>, seed: u64, noise_std: f64) -> anyhow::Result<Array1<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Array1::random_using(depth.len(), Normal::new(0.0, noise_std)?, &mut rng);
    Ok(depth.mapv(|d| 2.0 * d + (2.0 * d).sin()) + noise)
}

/// Fit the synthetic target on the table's depth column
pub fn fit_linear(table: &GridTable, settings: &LinearConfig) -> anyhow::Result<LinearOutcome> {
    let depth = table.depth()?;
    info!("Fitting OLS on {} depth values", depth.len());

    let target = synthetic_target(&depth, settings.seed, settings.noise_std)?;
    let x = depth.clone().insert_axis(Axis(1));

    let mut model = LinearRegression::new(true);
    model.fit(&x, &target)?;
    let fitted = model.predict(&x)?;

    Ok(LinearOutcome {
        coefficient: model.coefficients.as_ref().map_or(f64::NAN, |c| c[0]),
        intercept: model.intercept.unwrap_or(f64::NAN),
        r_squared: model.r_squared.unwrap_or(f64::NAN),
        depth,
        target,
        fitted,
    })
}

/// Load the grid, fit, and plot data against the fitted line
pub fn run_linear(config: &Config) -> anyhow::Result<LinearOutcome> {
    let table = GridTable::load_csv(&config.data.grid_csv)?;
    let outcome = fit_linear(&table, &config.linear)?;

    let path = output_dir(config)?.join("linear_regression.svg");
    plot_fit(
        &path,
        "Linear Regression",
        ("Input Feature (X)", "Output (y)"),
        &outcome.depth.to_vec(),
        &outcome.target.to_vec(),
        &outcome.fitted.to_vec(),
    )?;
    info!("Saved plot to {}", path.display());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> GridTable {
        GridTable::from_reader("depth\n100\n250\n400\n520\n644\n810\n".as_bytes()).unwrap()
    }

    #[test]
    fn test_same_seed_same_target() {
        let depth = table().depth().unwrap();
        let first = synthetic_target(&depth, 42, 0.2).unwrap();
        assert_eq!(first, synthetic_target(&depth, 42, 0.2).unwrap());
        assert_ne!(first, synthetic_target(&depth, 43, 0.2).unwrap());
    }

    #[test]
    fn test_noise_free_target_is_exact() {
        let depth = table().depth().unwrap();
        let target = synthetic_target(&depth, 0, 0.0).unwrap();
        assert_eq!(target[0], 200.0 + (200.0f64).sin());
    }

    #[test]
    fn test_report_lines() {
        let outcome = fit_linear(&table(), &LinearConfig { seed: 42, noise_std: 0.2 }).unwrap();
        let report = outcome.to_string();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Intercept: "));
        let slope: f64 = lines[1].trim_start_matches("Coefficient: ").parse().unwrap();
        assert!((slope - 2.0).abs() < 0.01);
        assert_eq!(lines[2], format!("R-squared: {:.4}", outcome.r_squared));
    }
}
