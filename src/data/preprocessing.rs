//! Data preprocessing utilities for GAN training
//!
//! This module provides:
//! - Min-max scaling to the [0, 1] range (the WGAN generator ends in a sigmoid)
//! - CSV export of generated sample matrices

use std::path::Path;

use ndarray::{Array1, Array2, Axis};

use super::DataError;

/// Per-feature min-max scaler
///
/// Formula: x_scaled = (x - min) / (max - min)
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    pub min_vals: Array1<f64>,
    pub max_vals: Array1<f64>,
}

impl MinMaxScaler {
    /// Learn the per-column range of `data`
    pub fn fit(data: &Array2<f64>) -> Self {
        let min_vals = data.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let max_vals = data.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));
        Self { min_vals, max_vals }
    }

    /// Scale into [0, 1]; constant columns map to 0
    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        let mut scaled = data.clone();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let range = self.max_vals[j] - self.min_vals[j];
            if range > 0.0 {
                column.mapv_inplace(|v| (v - self.min_vals[j]) / range);
            } else {
                column.fill(0.0);
            }
        }
        scaled
    }

    /// Map scaled values back to the original units
    ///
    /// Formula: x = x_scaled * (max - min) + min
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Array2<f64> {
        let mut restored = data.clone();
        for (j, mut column) in restored.axis_iter_mut(Axis(1)).enumerate() {
            let range = self.max_vals[j] - self.min_vals[j];
            column.mapv_inplace(|v| v * range + self.min_vals[j]);
        }
        restored
    }

    pub fn fit_transform(data: &Array2<f64>) -> (Array2<f64>, Self) {
        let scaler = Self::fit(data);
        (scaler.transform(data), scaler)
    }
}

/// Write a sample matrix as CSV with a `sample_id` column and the given headers
pub fn save_samples_csv<P: AsRef<Path>>(
    path: P,
    headers: &[&str],
    samples: &Array2<f64>,
) -> Result<(), DataError> {
    if headers.len() != samples.ncols() {
        return Err(DataError::HeaderMismatch {
            expected: samples.ncols(),
            got: headers.len(),
        });
    }

    let mut writer = csv::Writer::from_path(path.as_ref())?;

    let mut header = vec!["sample_id"];
    header.extend_from_slice(headers);
    writer.write_record(&header)?;

    for (i, row) in samples.rows().into_iter().enumerate() {
        let mut record = vec![i.to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|source| DataError::Io {
        path: path.as_ref().display().to_string(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_scaler_roundtrip() {
        let data = array![[1.0, 10.0, 5.0], [3.0, 20.0, 5.0], [2.0, 15.0, 5.0]];
        let (scaled, scaler) = MinMaxScaler::fit_transform(&data);

        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 1.0, 0.5]);
        assert_eq!(scaled.column(2).to_vec(), vec![0.0, 0.0, 0.0]);

        let restored = scaler.inverse_transform(&scaled);
        for (a, b) in restored.iter().zip(data.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_save_samples_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        save_samples_csv(&path, &["x", "y"], &array![[0.5, 1.5], [2.0, -1.0]]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "sample_id,x,y");
        assert_eq!(lines[1], "0,0.5,1.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_save_rejects_header_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_samples_csv(dir.path().join("s.csv"), &["x"], &array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, DataError::HeaderMismatch { expected: 2, got: 1 }));
    }
}
