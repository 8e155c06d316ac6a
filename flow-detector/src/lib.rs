//! Flow Detector Library
//!
//! Trains a random forest that separates normal IoT network flows from attack
//! traffic. The library exposes each pipeline stage (loading, cleaning, label
//! binarization, categorical encoding, stratified splitting, scaling, forest
//! fitting and reporting) so they can be driven individually or through
//! [`Pipeline`].

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;

// Re-export commonly used types
pub use crate::config::{DetectorConfig, ForestConfig, MaxFeatures};
pub use crate::error::{DetectorError, Result};
pub use crate::model::RandomForest;
pub use crate::pipeline::{Dataset, Pipeline, PreparedData, RunOutcome};
pub use crate::report::{Evaluation, Reporter};
