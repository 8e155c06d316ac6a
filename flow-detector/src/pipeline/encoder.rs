use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use super::loader::{ColumnData, Dataset};

/// Category used for missing text cells
const MISSING_CATEGORY: &str = "";

/// Integer codes for one text column, assigned in sorted value order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnEncoding {
    codes: HashMap<String, usize>,
}

impl ColumnEncoding {
    fn from_values<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let distinct: BTreeSet<&str> = values.collect();
        let codes = distinct
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value.to_string(), code))
            .collect();
        Self { codes }
    }

    /// Number of known categories
    pub fn n_categories(&self) -> usize {
        self.codes.len()
    }

    /// Code for a value; values unseen at fit time share the code `n_categories()`
    pub fn encode(&self, value: &str) -> usize {
        self.codes.get(value).copied().unwrap_or(self.codes.len())
    }
}

/// Maps every text feature column to integer codes
#[derive(Debug, Clone, Default)]
pub struct CategoricalEncoder {
    columns: HashMap<String, ColumnEncoding>,
}

impl CategoricalEncoder {
    /// Learn the distinct values of each text column over the given rows
    pub fn fit(dataset: &Dataset, rows: &[usize]) -> Self {
        let mut columns = HashMap::new();

        for column in dataset.columns() {
            let ColumnData::Text(values) = &column.data else {
                continue;
            };

            let encoding = ColumnEncoding::from_values(
                rows.iter()
                    .map(|&r| values[r].as_deref().unwrap_or(MISSING_CATEGORY)),
            );
            debug!(
                column = %column.name,
                categories = encoding.n_categories(),
                "Fitted categorical encoding"
            );
            columns.insert(column.name.clone(), encoding);
        }

        Self { columns }
    }

    pub fn encoding(&self, column: &str) -> Option<&ColumnEncoding> {
        self.columns.get(column)
    }

    /// Replace every fitted text column with its integer codes
    pub fn transform(&self, dataset: &mut Dataset) -> usize {
        let mut encoded = 0;

        for column in dataset.columns_mut() {
            let Some(encoding) = self.columns.get(&column.name) else {
                continue;
            };
            if let ColumnData::Text(values) = &column.data {
                let codes = values
                    .iter()
                    .map(|v| {
                        let code = encoding.encode(v.as_deref().unwrap_or(MISSING_CATEGORY));
                        Some(code as f64)
                    })
                    .collect();
                column.data = ColumnData::Numeric(codes);
                encoded += 1;
            }
        }

        if encoded > 0 {
            info!(columns = encoded, "Encoded categorical columns");
        }
        encoded
    }
}
