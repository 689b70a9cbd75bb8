//! Regression models for the survey grid
//!
//! - `LinearRegression`: ordinary least squares
//! - `NonNegativeLinearRegression`: least squares with `β >= 0` and a free intercept

mod linear;
mod nnls;

pub use linear::{r_squared, LinearRegression, LinearRegressionError};
pub use nnls::{nnls, NnlsError, NonNegativeLinearRegression};
