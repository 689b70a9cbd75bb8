//! Survey grid table
//!
//! One row per grid cell with the sampling `depth`, fishing `effort` and the
//! `ARA` abundance index. The table comes from a CSV export of the survey
//! spreadsheet; extra columns are ignored and empty, `NA` or `NaN` cells are
//! read as missing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::Deserialize;
use tracing::{debug, info};

use super::DataError;

/// One raw row, any field may be missing
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GridRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub depth: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub effort: Option<f64>,
    #[serde(rename = "ARA", default, deserialize_with = "csv::invalid_option")]
    pub ara: Option<f64>,
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// The full table as read from disk
#[derive(Debug, Clone, Default)]
pub struct GridTable {
    rows: Vec<GridRow>,
}

impl GridTable {
    pub fn from_rows(rows: Vec<GridRow>) -> Self {
        Self { rows }
    }

    /// Load the table from a CSV file with a header row
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        info!("Loaded {} grid rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.deserialize() {
            rows.push(record?);
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// Depth values of the rows where depth is present
    pub fn depth(&self) -> Result<Array1<f64>, DataError> {
        let depth: Vec<f64> = self.rows.iter().filter_map(|row| present(row.depth)).collect();
        if depth.is_empty() {
            return Err(DataError::Empty {
                columns: vec!["depth"],
            });
        }
        debug!("{} of {} rows have a depth", depth.len(), self.len());
        Ok(Array1::from(depth))
    }

    /// Rows where depth, effort and ARA are all present
    pub fn complete_cases(&self) -> Result<GridFrame, DataError> {
        let mut depth = Vec::new();
        let mut effort = Vec::new();
        let mut ara = Vec::new();

        for row in &self.rows {
            if let (Some(d), Some(e), Some(a)) = (present(row.depth), present(row.effort), present(row.ara)) {
                depth.push(d);
                effort.push(e);
                ara.push(a);
            }
        }

        if depth.is_empty() {
            return Err(DataError::Empty {
                columns: vec!["depth", "effort", "ARA"],
            });
        }

        debug!(
            "Dropped {} incomplete rows, {} remain",
            self.len() - depth.len(),
            depth.len()
        );

        Ok(GridFrame {
            depth: Array1::from(depth),
            effort: Array1::from(effort),
            ara: Array1::from(ara),
        })
    }
}

/// Complete `depth`/`effort`/`ARA` columns ready for regression
#[derive(Debug, Clone, PartialEq)]
pub struct GridFrame {
    pub depth: Array1<f64>,
    pub effort: Array1<f64>,
    pub ara: Array1<f64>,
}

impl GridFrame {
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    /// `[depth, effort]` design matrix
    pub fn features(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), 2), |(i, j)| match j {
            0 => self.depth[i],
            _ => self.effort[i],
        })
    }

    /// `depth * effort` interaction column
    pub fn interaction(&self) -> Array1<f64> {
        &self.depth * &self.effort
    }

    /// `[depth, effort, depth * effort]` design matrix
    pub fn features_with_interaction(&self) -> Array2<f64> {
        let interaction = self.interaction();
        Array2::from_shape_fn((self.len(), 3), |(i, j)| match j {
            0 => self.depth[i],
            1 => self.effort[i],
            _ => interaction[i],
        })
    }

    /// `[depth, effort, ARA]` matrix, one row per cell
    pub fn to_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), 3), |(i, j)| match j {
            0 => self.depth[i],
            1 => self.effort[i],
            _ => self.ara[i],
        })
    }

    pub fn target(&self) -> &Array1<f64> {
        &self.ara
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
cell,depth,effort,ARA,notes
1,400,12.5,3.2,a
2,520,,4.1,b
3,,20.0,1.0,c
4,644,30.925,NA,d
5,700,18.0,5.5,e
6,NaN,10.0,2.0,f
";

    #[test]
    fn test_parse_with_missing_values() {
        let table = GridTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.rows()[1].effort, None);
        assert_eq!(table.rows()[3].ara, None);
        assert_eq!(table.rows()[0].ara, Some(3.2));
    }

    #[test]
    fn test_depth_drops_missing() {
        let table = GridTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let depth = table.depth().unwrap();
        assert_eq!(depth.to_vec(), vec![400.0, 520.0, 644.0, 700.0]);
    }

    #[test]
    fn test_complete_cases() {
        let table = GridTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let frame = table.complete_cases().unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.depth.to_vec(), vec![400.0, 700.0]);
        assert_eq!(frame.ara.to_vec(), vec![3.2, 5.5]);

        let x = frame.features_with_interaction();
        assert_eq!(x.dim(), (2, 3));
        assert_eq!(x[[0, 2]], 400.0 * 12.5);
    }

    #[test]
    fn test_empty_after_filtering() {
        let table = GridTable::from_reader("depth,effort,ARA\n1,,\n".as_bytes()).unwrap();
        assert!(matches!(table.complete_cases(), Err(DataError::Empty { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = GridTable::load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
