// Dataset Loader
//
// Reads a headered CSV of network-flow records into a column table. Each
// column is typed once at load time: numeric when every present cell parses
// as a float, text otherwise. The label column is always kept as raw text.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{DetectorError, Result};

/// Cell spellings treated as missing values
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Values of a single column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Numeric column, `None` marks a missing cell
    Numeric(Vec<Option<f64>>),
    /// Text column, `None` marks a missing cell
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    /// Render a single cell for previews
    fn display_cell(&self, row: usize) -> String {
        match self {
            ColumnData::Numeric(v) => match v[row] {
                Some(x) => format!("{}", x),
                None => "NaN".to_string(),
            },
            ColumnData::Text(v) => v[row].clone().unwrap_or_else(|| "NaN".to_string()),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }
}

/// In-memory table of flow records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset from pre-typed columns; all columns must have the same length
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        {
            let mut seen = HashSet::new();
            for column in &columns {
                if column.data.len() != n_rows {
                    return Err(DetectorError::Input(format!(
                        "column '{}' has {} rows, expected {}",
                        column.name,
                        column.data.len(),
                        n_rows
                    )));
                }
                if !seen.insert(column.name.as_str()) {
                    return Err(DetectorError::Input(format!(
                        "duplicate column '{}'",
                        column.name
                    )));
                }
            }
        }
        Ok(Self { columns, n_rows })
    }

    /// Load a CSV file, keeping `label_column` as raw text
    pub fn from_csv_path(path: impl AsRef<Path>, label_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            DetectorError::Input(format!("cannot open dataset {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), "Loading dataset");
        Self::from_reader(file, label_column)
    }

    /// Load CSV content from any reader, keeping `label_column` as raw text
    pub fn from_reader<R: Read>(reader: R, label_column: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| DetectorError::Input(format!("unreadable header: {}", e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(DetectorError::Input("dataset has no header row".to_string()));
        }

        if !headers.iter().any(|h| h == label_column) {
            return Err(DetectorError::Input(format!(
                "missing label column '{}'",
                label_column
            )));
        }

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record =
                record.map_err(|e| DetectorError::Input(format!("unparseable row: {}", e)))?;
            for (cells, field) in raw.iter_mut().zip(record.iter()) {
                cells.push(field.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| {
                if name == label_column {
                    Column::text(name, cells.into_iter().map(Some).collect())
                } else {
                    infer_column(name, cells)
                }
            })
            .collect();

        let dataset = Self::from_columns(columns)?;
        debug!(
            rows = dataset.n_rows(),
            columns = dataset.n_columns(),
            numeric = dataset.columns.iter().filter(|c| c.data.is_numeric()).count(),
            "Dataset parsed"
        );
        Ok(dataset)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Remove a column, returning it when present
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Render the first `n` rows as an aligned text table
    pub fn preview(&self, n: usize) -> String {
        let rows = n.min(self.n_rows);
        let index_width = rows.saturating_sub(1).to_string().len();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .map(|c| {
                (0..rows)
                    .map(|r| c.data.display_cell(r).len())
                    .chain(std::iter::once(c.name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let _ = write!(out, "{:>w$}", "", w = index_width);
        for (column, width) in self.columns.iter().zip(&widths) {
            let _ = write!(out, "  {:>w$}", column.name, w = width);
        }
        out.push('\n');

        for r in 0..rows {
            let _ = write!(out, "{:>w$}", r, w = index_width);
            for (column, width) in self.columns.iter().zip(&widths) {
                let _ = write!(out, "  {:>w$}", column.data.display_cell(r), w = width);
            }
            out.push('\n');
        }

        let _ = write!(out, "\n[{} rows x {} columns]", self.n_rows, self.columns.len());
        out
    }
}

fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell.trim())
}

/// Type a raw column: numeric if every present cell parses as f64
fn infer_column(name: String, cells: Vec<String>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| {
            if is_missing(cell) {
                Some(None)
            } else {
                cell.trim().parse::<f64>().ok().map(Some)
            }
        })
        .collect();

    match parsed {
        Some(values) => Column::numeric(name, values),
        None => Column::text(
            name,
            cells
                .into_iter()
                .map(|cell| if is_missing(&cell) { None } else { Some(cell) })
                .collect(),
        ),
    }
}
