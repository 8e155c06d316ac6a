use tracing::info;

use super::loader::{ColumnData, Dataset};
use crate::error::{DetectorError, Result};

/// Label value of benign traffic
pub const NORMAL_LABEL: &str = "normal";

/// Collapse a multi-class label to 0 (normal) or 1 (any attack).
/// Comparison is case-insensitive and does not trim whitespace.
pub fn binarize_label(raw: &str) -> u8 {
    if raw.to_lowercase() == NORMAL_LABEL {
        0
    } else {
        1
    }
}

/// Remove the label column from the table and return it binarized
pub fn extract_labels(dataset: &mut Dataset, label_column: &str) -> Result<Vec<u8>> {
    let column = dataset.remove_column(label_column).ok_or_else(|| {
        DetectorError::Input(format!("missing label column '{}'", label_column))
    })?;

    let labels: Vec<u8> = match &column.data {
        ColumnData::Text(values) => values
            .iter()
            .map(|v| binarize_label(v.as_deref().unwrap_or("")))
            .collect(),
        ColumnData::Numeric(values) => values
            .iter()
            .map(|v| v.map_or(1, |x| binarize_label(&x.to_string())))
            .collect(),
    };

    let positives = labels.iter().filter(|&&l| l == 1).count();
    info!(
        normal = labels.len() - positives,
        attack = positives,
        "Binarized label column '{}'",
        label_column
    );
    Ok(labels)
}
