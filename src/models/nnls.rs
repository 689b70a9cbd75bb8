//! Non-negative least squares regression
//!
//! Coefficients are constrained to be `>= 0` while the intercept is free.
//! The data are centred first so the intercept drops out of the constrained
//! problem, which is then solved with the Lawson–Hanson active-set method:
//!
//! 1. Start with every coefficient at zero (all in the active set).
//! 2. Move the coordinate with the largest positive gradient into the
//!    passive set and solve unconstrained least squares on that set.
//! 3. If the solution leaves the feasible region, step back along the
//!    segment to the boundary and return the zeroed coordinates to the
//!    active set.
//! 4. Stop when no active coordinate would decrease the residual.

use ndarray::{Array1, Array2, Axis};
use thiserror::Error;
use tracing::debug;

use super::linear::solve_normal_equations;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NnlsError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Cannot fit on an empty sample")]
    EmptyInput,

    #[error("Active-set iteration did not converge after {0} steps")]
    NoConvergence(usize),

    #[error("Model has not been fitted yet")]
    NotFitted,
}

/// Linear regression with non-negative coefficients and a free intercept
#[derive(Debug, Clone, Default)]
pub struct NonNegativeLinearRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
}

impl NonNegativeLinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), NnlsError> {
        if x.nrows() != y.len() {
            return Err(NnlsError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        let x_mean = x.mean_axis(Axis(0)).ok_or(NnlsError::EmptyInput)?;
        let y_mean = y.mean().ok_or(NnlsError::EmptyInput)?;

        let x_centered = x - &x_mean;
        let y_centered = y - y_mean;

        let beta = nnls(&x_centered, &y_centered)?;
        let intercept = y_mean - x_mean.dot(&beta);
        debug!("NNLS fit on {} rows: intercept={} coefficients={}", x.nrows(), intercept, beta);

        self.coefficients = Some(beta);
        self.intercept = Some(intercept);
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, NnlsError> {
        let coefficients = self.coefficients.as_ref().ok_or(NnlsError::NotFitted)?;
        let intercept = self.intercept.ok_or(NnlsError::NotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(NnlsError::DimensionMismatch {
                expected: coefficients.len(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(coefficients) + intercept)
    }

    /// Prediction for a single feature vector
    pub fn predict_one(&self, features: &[f64]) -> Result<f64, NnlsError> {
        let coefficients = self.coefficients.as_ref().ok_or(NnlsError::NotFitted)?;
        let intercept = self.intercept.ok_or(NnlsError::NotFitted)?;
        if features.len() != coefficients.len() {
            return Err(NnlsError::DimensionMismatch {
                expected: coefficients.len(),
                got: features.len(),
            });
        }
        Ok(intercept + features.iter().zip(coefficients).map(|(x, c)| x * c).sum::<f64>())
    }
}

/// Solve `min ||A x - b||` subject to `x >= 0`
pub fn nnls(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, NnlsError> {
    if a.nrows() != b.len() {
        return Err(NnlsError::DimensionMismatch {
            expected: a.nrows(),
            got: b.len(),
        });
    }
    let n = a.ncols();

    // The solution is invariant to positive column scaling; unit columns keep
    // the normal equations well conditioned when features differ in magnitude.
    let norms: Array1<f64> = a
        .axis_iter(Axis(1))
        .map(|col| {
            let norm = col.dot(&col).sqrt();
            if norm > 0.0 {
                norm
            } else {
                1.0
            }
        })
        .collect();
    let a = a / &norms;

    let tolerance = 10.0 * f64::EPSILON * (n.max(a.nrows()) as f64);
    let max_iter = 3 * n.max(1) * 10;

    let mut x = Array1::<f64>::zeros(n);
    let mut passive = vec![false; n];
    let mut iterations = 0;

    loop {
        let w = a.t().dot(&(b - &a.dot(&x)));
        let candidate = (0..n)
            .filter(|&j| !passive[j] && w[j] > tolerance)
            .max_by(|&i, &j| w[i].total_cmp(&w[j]));
        let Some(entering) = candidate else {
            break;
        };
        passive[entering] = true;

        loop {
            iterations += 1;
            if iterations > max_iter {
                return Err(NnlsError::NoConvergence(max_iter));
            }

            let s = passive_solve(&a, b, &passive);
            let infeasible: Vec<usize> = (0..n).filter(|&j| passive[j] && s[j] <= tolerance).collect();
            if infeasible.is_empty() {
                x = s;
                break;
            }

            // Step from x toward s until the first passive coordinate hits zero
            let alpha = infeasible
                .iter()
                .map(|&j| {
                    let denom = x[j] - s[j];
                    if denom > 0.0 {
                        x[j] / denom
                    } else {
                        0.0
                    }
                })
                .fold(f64::INFINITY, f64::min);
            x = &x + &((&s - &x) * alpha);

            for j in 0..n {
                if passive[j] && x[j] <= tolerance {
                    passive[j] = false;
                    x[j] = 0.0;
                }
            }
        }
    }

    Ok(x / &norms)
}

/// Unconstrained least squares on the passive columns, zero elsewhere
fn passive_solve(a: &Array2<f64>, b: &Array1<f64>, passive: &[bool]) -> Array1<f64> {
    let columns: Vec<usize> = (0..passive.len()).filter(|&j| passive[j]).collect();
    let mut solution = Array1::zeros(passive.len());
    if columns.is_empty() {
        return solution;
    }

    let a_p = a.select(Axis(1), &columns);
    let z = solve_normal_equations(&a_p.t().dot(&a_p), &a_p.t().dot(b));
    for (k, &j) in columns.iter().enumerate() {
        solution[j] = z[k];
    }
    solution
}
