//! Ordinary least squares regression
//!
//! Fits `y = intercept + X·β` through the normal equations. The survey
//! procedures use it on a single `depth` feature but nothing here assumes a
//! particular width.

use ndarray::{s, Array1, Array2};
use thiserror::Error;
use tracing::debug;

/// Errors raised by [`LinearRegression`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinearRegressionError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Cannot fit on an empty sample")]
    EmptyInput,

    #[error("Model has not been fitted yet")]
    NotFitted,
}

/// Least squares fit with an optional intercept
#[derive(Debug, Clone)]
pub struct LinearRegression {
    /// One slope per feature column
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    fit_intercept: bool,
    /// R-squared score on the training sample
    pub r_squared: Option<f64>,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LinearRegression {
    pub fn new(fit_intercept: bool) -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept,
            r_squared: None,
        }
    }

    /// Solve `(XᵀX) β = Xᵀy`, with a leading ones column when an intercept is fitted
    ///
    /// Deterministic: the same `x` and `y` give bit-identical coefficients.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), LinearRegressionError> {
        if x.nrows() != y.len() {
            return Err(LinearRegressionError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(LinearRegressionError::EmptyInput);
        }

        let x_design = if self.fit_intercept {
            let mut design = Array2::ones((x.nrows(), x.ncols() + 1));
            design.slice_mut(s![.., 1..]).assign(x);
            design
        } else {
            x.clone()
        };

        let gram = x_design.t().dot(&x_design);
        let moments = x_design.t().dot(y);
        let solution = solve_normal_equations(&gram, &moments);

        let (intercept, slopes) = if self.fit_intercept {
            (solution[0], solution.slice(s![1..]).to_owned())
        } else {
            (0.0, solution)
        };
        self.intercept = Some(intercept);
        self.coefficients = Some(slopes);

        let predictions = self.predict(x)?;
        self.r_squared = Some(r_squared(y, &predictions));
        debug!(
            "OLS fit on {} rows: intercept={:?} coefficients={:?}",
            x.nrows(),
            self.intercept,
            self.coefficients
        );

        Ok(())
    }

    /// `intercept + X·β` for each row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, LinearRegressionError> {
        let (Some(slopes), Some(intercept)) = (self.coefficients.as_ref(), self.intercept) else {
            return Err(LinearRegressionError::NotFitted);
        };
        if x.ncols() != slopes.len() {
            return Err(LinearRegressionError::DimensionMismatch {
                expected: slopes.len(),
                got: x.ncols(),
            });
        }

        Ok(x.dot(slopes) + intercept)
    }
}

/// Coefficient of determination of `predictions` against `y`
pub fn r_squared(y: &Array1<f64>, predictions: &Array1<f64>) -> f64 {
    let centred = y - y.mean().unwrap_or(0.0);
    let residuals = y - predictions;
    let total = centred.dot(&centred);
    let unexplained = residuals.dot(&residuals);
    if total == 0.0 {
        return if unexplained == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - unexplained / total
}

/// Ridge added to the diagonal, relative to the mean diagonal entry
const RIDGE_STEPS: [f64; 4] = [1e-12, 1e-9, 1e-6, 1e-3];

/// Solve `A x = b` for symmetric positive semi-definite `A`
///
/// Rank-deficient systems (a constant depth column, duplicated features) get
/// a growing ridge until the Cholesky factorisation succeeds. A system that
/// never factors is solved on its diagonal alone.
pub(crate) fn solve_normal_equations(xtx: &Array2<f64>, xty: &Array1<f64>) -> Array1<f64> {
    let n = xtx.nrows();
    let scale = (xtx.diag().sum() / n.max(1) as f64).abs().max(1.0);

    for ridge in RIDGE_STEPS {
        let mut regularised = xtx.clone();
        regularised.diag_mut().mapv_inplace(|d| d + ridge * scale);
        if let Some(factor) = lower_cholesky(&regularised) {
            if ridge > RIDGE_STEPS[0] {
                debug!("Normal equations needed ridge {:e} to factor", ridge * scale);
            }
            return substitute(&factor, xty);
        }
    }

    debug!("Normal equations ({}x{}) did not factor, using the diagonal", n, n);
    Array1::from_shape_fn(n, |i| {
        let d = xtx[[i, i]];
        if d > 0.0 {
            xty[i] / d
        } else {
            0.0
        }
    })
}

/// Lower-triangular `L` with `A = L·Lᵀ`, or `None` if `A` is not positive definite
fn lower_cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut factor = Array2::<f64>::zeros((n, n));

    for row in 0..n {
        for col in 0..=row {
            let partial = factor.slice(s![row, ..col]).dot(&factor.slice(s![col, ..col]));
            let value = a[[row, col]] - partial;
            factor[[row, col]] = if row == col {
                if value.is_nan() || value <= 0.0 {
                    return None;
                }
                value.sqrt()
            } else {
                value / factor[[col, col]]
            };
        }
    }

    Some(factor)
}

/// Forward then backward substitution through `L·Lᵀ x = b`
fn substitute(factor: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();

    let mut forward = Array1::<f64>::zeros(n);
    for row in 0..n {
        let known = factor.slice(s![row, ..row]).dot(&forward.slice(s![..row]));
        forward[row] = (b[row] - known) / factor[[row, row]];
    }

    let mut solution = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let known = factor.slice(s![row + 1.., row]).dot(&solution.slice(s![row + 1..]));
        solution[row] = (forward[row] - known) / factor[[row, row]];
    }

    solution
}
