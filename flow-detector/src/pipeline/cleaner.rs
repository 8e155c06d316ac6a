use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::loader::{ColumnData, Dataset};

/// Remove every listed column that exists; absent names are ignored.
/// Returns the names actually dropped.
pub fn drop_columns<S: AsRef<str>>(dataset: &mut Dataset, names: &[S]) -> Vec<String> {
    let mut dropped = Vec::new();
    for name in names {
        let name = name.as_ref();
        if dataset.remove_column(name).is_some() {
            dropped.push(name.to_string());
        } else {
            debug!(column = name, "Column not present, nothing to drop");
        }
    }

    if !dropped.is_empty() {
        info!(columns = ?dropped, "Dropped irrelevant columns");
    }
    dropped
}

/// Fills missing numeric cells with the column mean
#[derive(Debug, Clone, Default)]
pub struct MeanImputer {
    means: HashMap<String, f64>,
}

impl MeanImputer {
    /// Compute per-column means over the given rows, ignoring missing cells.
    /// A column with no observed value over `rows` gets a fill value of 0.0.
    pub fn fit(dataset: &Dataset, rows: &[usize]) -> Self {
        let mut means = HashMap::new();

        for column in dataset.columns() {
            let ColumnData::Numeric(values) = &column.data else {
                continue;
            };

            let (sum, count) = rows
                .iter()
                .filter_map(|&r| values[r])
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

            let mean = if count > 0 {
                sum / count as f64
            } else {
                warn!(
                    column = %column.name,
                    "Numeric column has no observed values, imputing 0.0"
                );
                0.0
            };
            means.insert(column.name.clone(), mean);
        }

        Self { means }
    }

    /// Fill value learned for a column
    pub fn mean(&self, column: &str) -> Option<f64> {
        self.means.get(column).copied()
    }

    /// Replace missing numeric cells in every row; returns the number of cells filled
    pub fn apply(&self, dataset: &mut Dataset) -> usize {
        let mut filled = 0;

        for column in dataset.columns_mut() {
            let Some(&mean) = self.means.get(&column.name) else {
                continue;
            };
            if let ColumnData::Numeric(values) = &mut column.data {
                for value in values.iter_mut().filter(|v| v.is_none()) {
                    *value = Some(mean);
                    filled += 1;
                }
            }
        }

        if filled > 0 {
            info!(cells = filled, "Imputed missing numeric values with column means");
        }
        filled
    }
}
