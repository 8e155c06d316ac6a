pub mod metrics;
pub mod plots;

use std::path::PathBuf;

use tracing::info;

use crate::config::ReportConfig;
use crate::error::Result;

pub use metrics::{ClassMetrics, Evaluation, RocCurve};

/// File name of the confusion matrix chart
pub const CONFUSION_MATRIX_FILE: &str = "confusion_matrix.svg";
/// File name of the ROC chart
pub const ROC_CURVE_FILE: &str = "roc_curve.svg";

/// Prints the evaluation and renders its charts
#[derive(Debug, Clone)]
pub struct Reporter {
    config: ReportConfig,
}

impl Reporter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Console summary: accuracy, classification report and ROC AUC
    pub fn summary(eval: &Evaluation) -> String {
        format!(
            "\nAccuracy: {}\n\nClassification Report:\n{}\nROC AUC: {:.4}",
            eval.accuracy,
            eval.classification_report(),
            eval.auc
        )
    }

    pub fn print_summary(&self, eval: &Evaluation) {
        println!("{}", Self::summary(eval));
    }

    /// Render both charts into the output directory; returns the written paths
    pub fn render_plots(&self, eval: &Evaluation) -> Result<Vec<PathBuf>> {
        if !self.config.plots {
            info!("Chart rendering disabled");
            return Ok(Vec::new());
        }

        std::fs::create_dir_all(&self.config.output_dir)?;

        let confusion_path = self.config.output_dir.join(CONFUSION_MATRIX_FILE);
        plots::render_confusion_matrix(eval, &confusion_path)?;

        let roc_path = self.config.output_dir.join(ROC_CURVE_FILE);
        plots::render_roc_curve(eval, &roc_path)?;

        info!(
            confusion_matrix = %confusion_path.display(),
            roc_curve = %roc_path.display(),
            "📊 Charts written"
        );
        Ok(vec![confusion_path, roc_path])
    }

    /// Print the summary, then render the charts
    pub fn report(&self, eval: &Evaluation) -> Result<Vec<PathBuf>> {
        self.print_summary(eval);
        self.render_plots(eval)
    }
}
