// Evaluation Metrics
//
// Accuracy, confusion matrix, per-class precision/recall/F1 and the ROC curve
// for a binary detector. Precision and recall are 0.0 when their denominator
// is empty.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{DetectorError, Result};

/// Class names in label order
pub const CLASS_LABELS: [u8; 2] = [0, 1];

/// Precision, recall and F1 for one class or an average
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Receiver operating characteristic points, thresholds descending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Sweep every distinct score as a threshold; starts at (0, 0) for +inf
    pub fn compute(y_true: &[u8], scores: &[f64]) -> Result<Self> {
        if y_true.len() != scores.len() {
            return Err(DetectorError::Data(format!(
                "{} labels for {} scores",
                y_true.len(),
                scores.len()
            )));
        }

        let positives = y_true.iter().filter(|&&y| y == 1).count();
        let negatives = y_true.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(DetectorError::Data(
                "ROC curve needs both classes in the test labels".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];
        let mut thresholds = vec![f64::INFINITY];
        let (mut tp, mut fp) = (0usize, 0usize);

        for (pos, &i) in order.iter().enumerate() {
            if y_true[i] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            let last_of_threshold = order
                .get(pos + 1)
                .map_or(true, |&next| scores[next] != scores[i]);
            if last_of_threshold {
                fpr.push(fp as f64 / negatives as f64);
                tpr.push(tp as f64 / positives as f64);
                thresholds.push(scores[i]);
            }
        }

        Ok(Self {
            fpr,
            tpr,
            thresholds,
        })
    }

    /// Area under the curve by the trapezoidal rule
    pub fn auc(&self) -> f64 {
        self.fpr
            .windows(2)
            .zip(self.tpr.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[1] + y[0]) / 2.0)
            .sum()
    }
}

/// Full evaluation of a binary detector on a test subset
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub accuracy: f64,
    /// Rows are actual classes, columns predicted classes
    pub confusion: [[usize; 2]; 2],
    /// Metrics for class 0 and class 1
    pub per_class: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub roc: RocCurve,
    pub auc: f64,
    pub generated_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn compute(y_true: &[u8], y_pred: &[u8], y_prob: &[f64]) -> Result<Self> {
        if y_true.is_empty() {
            return Err(DetectorError::Data("test subset is empty".to_string()));
        }
        if y_true.len() != y_pred.len() {
            return Err(DetectorError::Data(format!(
                "{} labels for {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let confusion = confusion_matrix(y_true, y_pred);
        let total = y_true.len();
        let correct = confusion[0][0] + confusion[1][1];
        let accuracy = correct as f64 / total as f64;

        let per_class = [class_metrics(&confusion, 0), class_metrics(&confusion, 1)];
        let macro_avg = average(&per_class, |_| 1.0, 2.0);
        let weighted_avg = average(&per_class, |m| m.support as f64, total as f64);

        let roc = RocCurve::compute(y_true, y_prob)?;
        let auc = roc.auc();

        Ok(Self {
            accuracy,
            confusion,
            per_class,
            macro_avg,
            weighted_avg,
            roc,
            auc,
            generated_at: Utc::now(),
        })
    }

    /// Text report laid out like scikit-learn's `classification_report`
    pub fn classification_report(&self) -> String {
        let width = "weighted avg".len();
        let support = self.per_class[0].support + self.per_class[1].support;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        );
        out.push('\n');
        for (label, m) in CLASS_LABELS.iter().zip(&self.per_class) {
            write_row(&mut out, &label.to_string(), m, width);
        }
        out.push('\n');
        let _ = writeln!(
            out,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, support
        );
        write_row(&mut out, "macro avg", &self.macro_avg, width);
        write_row(&mut out, "weighted avg", &self.weighted_avg, width);
        out
    }
}

fn write_row(out: &mut String, name: &str, m: &ClassMetrics, width: usize) {
    let _ = writeln!(
        out,
        "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, m.precision, m.recall, m.f1, m.support
    );
}

/// Counts indexed by `[actual][predicted]`
pub fn confusion_matrix(y_true: &[u8], y_pred: &[u8]) -> [[usize; 2]; 2] {
    let mut matrix = [[0usize; 2]; 2];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        matrix[usize::from(t.min(1))][usize::from(p.min(1))] += 1;
    }
    matrix
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn class_metrics(confusion: &[[usize; 2]; 2], class: usize) -> ClassMetrics {
    let other = 1 - class;
    let tp = confusion[class][class];
    let fp = confusion[other][class];
    let fn_ = confusion[class][other];

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        precision,
        recall,
        f1,
        support: tp + fn_,
    }
}

fn average(
    classes: &[ClassMetrics; 2],
    weight: impl Fn(&ClassMetrics) -> f64,
    total: f64,
) -> ClassMetrics {
    let mean = |field: fn(&ClassMetrics) -> f64| {
        if total > 0.0 {
            classes.iter().map(|m| field(m) * weight(m)).sum::<f64>() / total
        } else {
            0.0
        }
    };

    ClassMetrics {
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1: mean(|m| m.f1),
        support: classes.iter().map(|m| m.support).sum(),
    }
}
