use thiserror::Error;

/// Errors that can occur while training or evaluating the detector
#[derive(Error, Debug)]
pub enum DetectorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input error (missing file, unparseable table, missing label column)
    #[error("Input error: {0}")]
    Input(String),

    /// Data error (degenerate label distribution, empty split)
    #[error("Data error: {0}")]
    Data(String),

    /// Model fitting or prediction error
    #[error("Fit error: {0}")]
    Fit(String),

    /// Chart rendering error
    #[error("Plot error: {0}")]
    Plot(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using DetectorError
pub type Result<T> = std::result::Result<T, DetectorError>;

impl From<serde_json::Error> for DetectorError {
    fn from(err: serde_json::Error) -> Self {
        DetectorError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for DetectorError {
    fn from(err: toml::ser::Error) -> Self {
        DetectorError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for DetectorError {
    fn from(err: config::ConfigError) -> Self {
        DetectorError::Config(err.to_string())
    }
}
