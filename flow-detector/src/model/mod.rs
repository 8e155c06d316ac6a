//! Classifier models

pub mod forest;

pub use forest::RandomForest;
