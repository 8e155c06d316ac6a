//! Training pipeline
//!
//! Eight sequential stages: load, clean, binarize labels, encode categories,
//! split, scale, fit the forest, report. Each stage consumes the whole output
//! of the previous one.

pub mod cleaner;
pub mod encoder;
pub mod features;
pub mod labels;
pub mod loader;
pub mod scaler;
pub mod split;

use ndarray::Array2;
use tracing::{info, instrument};

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::model::RandomForest;
use crate::report::{Evaluation, Reporter};

pub use cleaner::{drop_columns, MeanImputer};
pub use encoder::CategoricalEncoder;
pub use features::FeatureMatrix;
pub use labels::{binarize_label, extract_labels};
pub use loader::{Column, ColumnData, Dataset};
pub use scaler::StandardScaler;
pub use split::{SplitIndices, StratifiedSplit};

/// Scaled train/test matrices ready for the classifier
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub feature_names: Vec<String>,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    pub split: SplitIndices,
    pub scaler: StandardScaler,
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub evaluation: Evaluation,
    pub predictions: Vec<u8>,
    pub probabilities: Vec<f64>,
    pub y_test: Vec<u8>,
    pub plot_paths: Vec<std::path::PathBuf>,
}

/// Drives a single training run
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: DetectorConfig,
}

impl Pipeline {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Load the configured dataset and print a preview
    pub fn load(&self) -> Result<Dataset> {
        let dataset = Dataset::from_csv_path(
            &self.config.dataset.path,
            &self.config.dataset.label_column,
        )?;
        println!("Data loaded successfully");
        println!("{}", dataset.preview(self.config.dataset.preview_rows));
        Ok(dataset)
    }

    /// Clean, binarize, split, encode and scale a loaded dataset
    #[instrument(skip_all, fields(rows = dataset.n_rows(), columns = dataset.n_columns()))]
    pub fn prepare(&self, mut dataset: Dataset) -> Result<PreparedData> {
        let cfg = &self.config;

        drop_columns(&mut dataset, cfg.dataset.drop_columns.as_slice());
        let labels = extract_labels(&mut dataset, &cfg.dataset.label_column)?;

        // The split depends only on labels, so it is fixed before any fitting
        let split = StratifiedSplit::new(cfg.split.test_size, cfg.split.seed).split(&labels)?;

        let all_rows: Vec<usize>;
        let fit_rows: &[usize] = if cfg.preprocessing.fit_on_train_only {
            &split.train
        } else {
            all_rows = (0..dataset.n_rows()).collect();
            &all_rows
        };

        MeanImputer::fit(&dataset, fit_rows).apply(&mut dataset);
        CategoricalEncoder::fit(&dataset, fit_rows).transform(&mut dataset);

        let features = FeatureMatrix::from_dataset(&dataset)?;
        let train = features.select_rows(&split.train);
        let test = features.select_rows(&split.test);

        let scaler = StandardScaler::fit(train.values())?;
        let x_train = scaler.transform(train.values())?;
        let x_test = scaler.transform(test.values())?;

        let y_train = split.train.iter().map(|&r| labels[r]).collect();
        let y_test = split.test.iter().map(|&r| labels[r]).collect();

        info!(
            features = features.n_features(),
            train = x_train.nrows(),
            test = x_test.nrows(),
            "Prepared feature matrices"
        );

        Ok(PreparedData {
            feature_names: features.feature_names().to_vec(),
            x_train,
            x_test,
            y_train,
            y_test,
            split,
            scaler,
        })
    }

    /// Fit the forest and score the test subset
    pub async fn train_and_evaluate(
        &self,
        data: &PreparedData,
    ) -> Result<(Evaluation, Vec<u8>, Vec<f64>)> {
        let forest = RandomForest::fit(
            &data.x_train,
            &data.y_train,
            &self.config.forest,
            self.config.split.seed,
        )
        .await?;

        let probabilities = forest.predict_probability(&data.x_test)?;
        let predictions = forest.predict(&data.x_test)?;
        let evaluation = Evaluation::compute(&data.y_test, &predictions, &probabilities)?;

        info!(
            accuracy = evaluation.accuracy,
            auc = evaluation.auc,
            "✓ Evaluation complete"
        );
        Ok((evaluation, predictions, probabilities))
    }

    /// Run all stages on an already loaded dataset
    pub async fn run_on(&self, dataset: Dataset) -> Result<RunOutcome> {
        let data = self.prepare(dataset)?;
        let (evaluation, predictions, probabilities) = self.train_and_evaluate(&data).await?;

        let plot_paths = Reporter::new(self.config.report.clone()).report(&evaluation)?;

        Ok(RunOutcome {
            evaluation,
            predictions,
            probabilities,
            y_test: data.y_test,
            plot_paths,
        })
    }

    /// Run all stages starting from the configured CSV
    pub async fn run(&self) -> Result<RunOutcome> {
        let dataset = self.load()?;
        self.run_on(dataset).await
    }
}
