use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{DetectorError, Result};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "FLOWDETECT";

/// Main configuration for a detector training run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Input dataset settings
    pub dataset: DatasetConfig,
    /// Imputation and encoding settings
    pub preprocessing: PreprocessingConfig,
    /// Train/test split settings
    pub split: SplitConfig,
    /// Random forest hyperparameters
    pub forest: ForestConfig,
    /// Report and chart output
    pub report: ReportConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Input dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to the labeled CSV file
    pub path: PathBuf,
    /// Name of the multi-class label column
    pub label_column: String,
    /// Columns removed before training when present
    pub drop_columns: Vec<String>,
    /// Number of rows printed after loading
    pub preview_rows: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("EdgeIIoTset.csv"),
            label_column: "label".to_string(),
            drop_columns: vec!["id".to_string(), "timestamp".to_string()],
            preview_rows: 5,
        }
    }
}

/// Preprocessing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Fit the mean imputer and categorical encoder on train rows only.
    /// When false both see the whole table before the split.
    pub fit_on_train_only: bool,
}

/// Train/test split configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows held out for testing (0.0 - 1.0, exclusive)
    pub test_size: f64,
    /// Seed shared by the splitter and the forest
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.25,
            seed: 42,
        }
    }
}

/// Number of candidate features sampled at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    /// ceil(sqrt(n_features))
    Sqrt,
    /// Every feature
    All,
    /// ceil(fraction * n_features), fraction in (0, 1]
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolve to a concrete feature count for a matrix with `n_features` columns
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fraction(f) => (f * n_features as f64).ceil() as usize,
        };
        n.clamp(1, n_features.max(1))
    }
}

/// Random forest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Maximum depth of each tree (unbounded when absent)
    pub max_depth: Option<u16>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in a leaf
    pub min_samples_leaf: usize,
    /// Features sampled at each split
    pub max_features: MaxFeatures,
    /// Blocking worker tasks used while fitting
    pub n_jobs: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 150,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            n_jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Render the confusion matrix and ROC charts
    pub plots: bool,
    /// Directory receiving the rendered charts
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            plots: true,
            output_dir: PathBuf::from("reports"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Emit JSON formatted log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "flow_detector=info".to_string(),
            json: false,
        }
    }
}

impl DetectorConfig {
    /// Load configuration from a file (extension optional) with environment overrides,
    /// e.g. `FLOWDETECT_DATASET__PATH=/data/flows.csv`
    pub fn from_file(path: &str) -> std::result::Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.dataset.path.as_os_str().is_empty() {
            return Err(DetectorError::Config("Dataset path cannot be empty".to_string()));
        }

        if self.dataset.label_column.is_empty() {
            return Err(DetectorError::Config("Label column cannot be empty".to_string()));
        }

        if !(self.split.test_size > 0.0 && self.split.test_size < 1.0) {
            return Err(DetectorError::Config(format!(
                "test_size must be in (0, 1), got {}",
                self.split.test_size
            )));
        }

        if self.forest.n_trees == 0 {
            return Err(DetectorError::Config("Forest needs at least one tree".to_string()));
        }

        if self.forest.n_jobs == 0 {
            return Err(DetectorError::Config("n_jobs must be at least 1".to_string()));
        }

        if self.forest.min_samples_split < 2 {
            return Err(DetectorError::Config(
                "min_samples_split must be at least 2".to_string(),
            ));
        }

        if self.forest.min_samples_leaf == 0 {
            return Err(DetectorError::Config(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }

        if let MaxFeatures::Fraction(f) = self.forest.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(DetectorError::Config(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )));
            }
        }

        Ok(())
    }
}
