// Feature Matrix
//
// Dense numeric view of a fully cleaned and encoded dataset. Column order is
// fixed at construction and shared by every row subset taken from it, so the
// train and test matrices always line up feature for feature.

use ndarray::{Array2, Axis};

use super::loader::{ColumnData, Dataset};
use crate::error::{DetectorError, Result};

/// Numeric features with their names
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Assemble a matrix from a dataset whose columns are all numeric and complete
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let n_rows = dataset.n_rows();
        let n_cols = dataset.n_columns();
        let mut values = Array2::<f64>::zeros((n_rows, n_cols));
        let mut names = Vec::with_capacity(n_cols);

        for (j, column) in dataset.columns().iter().enumerate() {
            let ColumnData::Numeric(cells) = &column.data else {
                return Err(DetectorError::Data(format!(
                    "column '{}' is not encoded",
                    column.name
                )));
            };
            for (i, cell) in cells.iter().enumerate() {
                values[[i, j]] = cell.ok_or_else(|| {
                    DetectorError::Data(format!(
                        "column '{}' has a missing value at row {}",
                        column.name, i
                    ))
                })?;
            }
            names.push(column.name.clone());
        }

        Ok(Self { names, values })
    }

    /// Feature names in column order
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Subset of rows, in the order given
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }
}
