// Random Forest Classifier
//
// Ensemble of single-tree smartcore forests. Member `i` is seeded with
// `seed + i`; smartcore draws its bootstrap sample and samples `max_features`
// candidate columns at every split. Members are fitted in chunks on tokio's
// blocking pool and joined back in member order, so the fitted forest does
// not depend on `n_jobs`.
//
// The class-1 probability of a row is the fraction of trees voting 1.

use std::ops::Range;
use std::sync::Arc;

use futures::future::try_join_all;
use ndarray::Array2;
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::SplitCriterion;
use tracing::info;

use crate::config::ForestConfig;
use crate::error::{DetectorError, Result};

/// Type alias for a fitted smartcore ensemble member
type TreeModel = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Ensemble of randomized decision trees for binary labels
pub struct RandomForest {
    trees: Vec<TreeModel>,
    n_features: usize,
}

impl std::fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomForest")
            .field("n_trees", &self.trees.len())
            .field("n_features", &self.n_features)
            .finish()
    }
}

impl RandomForest {
    /// Fit the forest on standardized features and {0,1} labels
    pub async fn fit(
        x: &Array2<f64>,
        y: &[u8],
        config: &ForestConfig,
        seed: u64,
    ) -> Result<Self> {
        let (n_rows, n_features) = x.dim();

        if n_rows == 0 {
            return Err(DetectorError::Fit("training matrix has no rows".to_string()));
        }
        if n_features == 0 {
            return Err(DetectorError::Fit(
                "training matrix has no feature columns".to_string(),
            ));
        }
        if y.len() != n_rows {
            return Err(DetectorError::Fit(format!(
                "{} labels for {} training rows",
                y.len(),
                n_rows
            )));
        }
        if y.iter().all(|&label| label == y[0]) {
            return Err(DetectorError::Fit(
                "training labels contain a single class".to_string(),
            ));
        }
        if config.n_trees == 0 || config.n_jobs == 0 {
            return Err(DetectorError::Fit(
                "forest needs at least one tree and one worker".to_string(),
            ));
        }

        let mtry = config.max_features.resolve(n_features);
        info!(
            trees = config.n_trees,
            rows = n_rows,
            features = n_features,
            features_per_split = mtry,
            workers = config.n_jobs,
            "🎓 Training random forest"
        );

        let x = Arc::new(to_dense(x));
        let y: Arc<Vec<i32>> = Arc::new(y.iter().map(|&label| i32::from(label)).collect());

        let handles = chunk_ranges(config.n_trees, config.n_jobs)
            .into_iter()
            .map(|range| {
                let x = Arc::clone(&x);
                let y = Arc::clone(&y);
                let config = config.clone();
                tokio::task::spawn_blocking(move || {
                    range
                        .map(|index| grow_tree(&x, &y, index, mtry, &config, seed))
                        .collect::<Result<Vec<_>>>()
                })
            });

        let chunks = try_join_all(handles)
            .await
            .map_err(|e| DetectorError::Fit(format!("training task panicked: {}", e)))?;

        let mut trees = Vec::with_capacity(config.n_trees);
        for chunk in chunks {
            trees.extend(chunk?);
        }

        info!(trees = trees.len(), "✓ Random forest trained");
        Ok(Self { trees, n_features })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Probability of class 1 per row
    pub fn predict_probability(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.n_features {
            return Err(DetectorError::Fit(format!(
                "forest trained on {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }

        let dense = to_dense(x);
        let mut votes = vec![0usize; x.nrows()];
        for tree in &self.trees {
            let classes = tree
                .predict(&dense)
                .map_err(|e| DetectorError::Fit(format!("tree prediction failed: {}", e)))?;
            for (count, class) in votes.iter_mut().zip(classes) {
                if class == 1 {
                    *count += 1;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        Ok(votes.into_iter().map(|v| v as f64 / n_trees).collect())
    }

    /// Majority-vote class per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_probability(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }
}

/// Split `0..n` into at most `parts` contiguous, non-empty ranges
fn chunk_ranges(n: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.clamp(1, n.max(1));
    let base = n / parts;
    let extra = n % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        if len > 0 {
            ranges.push(start..start + len);
        }
        start += len;
    }
    ranges
}

/// Copy an ndarray matrix into smartcore's dense matrix
fn to_dense(x: &Array2<f64>) -> DenseMatrix<f64> {
    let rows: Vec<Vec<f64>> = x.outer_iter().map(|row| row.to_vec()).collect();
    DenseMatrix::from_2d_vec(&rows)
}

fn grow_tree(
    x: &DenseMatrix<f64>,
    y: &Vec<i32>,
    index: usize,
    mtry: usize,
    config: &ForestConfig,
    seed: u64,
) -> Result<TreeModel> {
    let mut params = RandomForestClassifierParameters::default()
        .with_n_trees(1)
        .with_m(mtry)
        .with_seed(seed.wrapping_add(index as u64))
        .with_criterion(SplitCriterion::Gini)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf);
    if let Some(depth) = config.max_depth {
        params = params.with_max_depth(depth);
    }

    RandomForestClassifier::fit(x, y, params)
        .map_err(|e| DetectorError::Fit(format!("tree {} failed to fit: {}", index, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaxFeatures;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Two well separated clusters: label 1 when the first feature is large
    fn separable(n: usize) -> (Array2<f64>, Vec<u8>) {
        let mut x = Array2::<f64>::zeros((n, 3));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let positive = i % 4 == 0;
            x[[i, 0]] = if positive {
                5.0 + (i % 7) as f64 * 0.1
            } else {
                -5.0 + (i % 5) as f64 * 0.1
            };
            x[[i, 1]] = (i % 3) as f64;
            x[[i, 2]] = (i % 11) as f64 * 0.5;
            y.push(u8::from(positive));
        }
        (x, y)
    }

    /// One informative column among `width` columns of uniform noise, one
    /// attack row in five
    fn one_signal_among_noise(n: usize, width: usize, seed: u64) -> (Array2<f64>, Vec<u8>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut x = Array2::<f64>::zeros((n, width));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let attack = i % 5 == 0;
            let centre = if attack { 3.0 } else { -3.0 };
            x[[i, 0]] = centre + rng.gen_range(-1.0..1.0);
            for j in 1..width {
                x[[i, j]] = rng.gen_range(-1.0..1.0);
            }
            y.push(u8::from(attack));
        }
        (x, y)
    }

    fn small_config(n_jobs: usize) -> ForestConfig {
        ForestConfig {
            n_trees: 20,
            max_features: MaxFeatures::All,
            n_jobs,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_chunk_ranges() {
        assert_eq!(chunk_ranges(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(chunk_ranges(2, 8), vec![0..1, 1..2]);
        assert_eq!(chunk_ranges(5, 1), vec![0..5]);
    }

    #[tokio::test]
    async fn test_fit_separable_data() {
        let (x, y) = separable(80);
        let forest = RandomForest::fit(&x, &y, &small_config(2), 42).await.unwrap();
        assert_eq!(forest.n_trees(), 20);

        let predictions = forest.predict(&x).unwrap();
        let correct = predictions.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct as f64 / y.len() as f64 > 0.95);

        let probabilities = forest.predict_probability(&x).unwrap();
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[tokio::test]
    async fn test_default_forest_finds_single_informative_feature() {
        for seed in [1, 2] {
            let (x, y) = one_signal_among_noise(400, 16, seed);
            let train = x.slice(ndarray::s![..300, ..]).to_owned();
            let test = x.slice(ndarray::s![300.., ..]).to_owned();

            let config = ForestConfig {
                n_jobs: 4,
                ..ForestConfig::default()
            };
            assert_eq!(config.max_features, MaxFeatures::Sqrt);
            let forest = RandomForest::fit(&train, &y[..300], &config, seed).await.unwrap();
            let predictions = forest.predict(&test).unwrap();

            let actual = &y[300..];
            let correct = predictions.iter().zip(actual).filter(|(p, t)| p == t).count();
            let attacks = actual.iter().filter(|&&t| t == 1).count();
            let caught = predictions
                .iter()
                .zip(actual)
                .filter(|&(&p, &t)| p == 1 && t == 1)
                .count();

            let accuracy = correct as f64 / actual.len() as f64;
            let recall = caught as f64 / attacks as f64;
            assert!(accuracy >= 0.95, "seed {}: accuracy {}", seed, accuracy);
            assert!(recall >= 0.85, "seed {}: attack recall {}", seed, recall);
        }
    }

    #[tokio::test]
    async fn test_worker_count_does_not_change_model() {
        let (x, y) = separable(60);
        let config = |n_jobs| ForestConfig {
            max_features: MaxFeatures::Sqrt,
            ..small_config(n_jobs)
        };
        let one = RandomForest::fit(&x, &y, &config(1), 7).await.unwrap();
        let four = RandomForest::fit(&x, &y, &config(4), 7).await.unwrap();
        assert_eq!(
            one.predict_probability(&x).unwrap(),
            four.predict_probability(&x).unwrap()
        );
    }

    #[tokio::test]
    async fn test_single_class_rejected() {
        let (x, _) = separable(20);
        let y = vec![0u8; 20];
        let err = RandomForest::fit(&x, &y, &small_config(1), 42).await.unwrap_err();
        assert!(matches!(err, DetectorError::Fit(_)));
    }

    #[tokio::test]
    async fn test_zero_features_rejected() {
        let x = Array2::<f64>::zeros((10, 0));
        let y: Vec<u8> = (0..10).map(|i| (i % 2) as u8).collect();
        let err = RandomForest::fit(&x, &y, &small_config(1), 42).await.unwrap_err();
        assert!(matches!(err, DetectorError::Fit(_)));
    }

    #[tokio::test]
    async fn test_feature_count_mismatch() {
        let (x, y) = separable(40);
        let forest = RandomForest::fit(&x, &y, &small_config(1), 42).await.unwrap();
        let narrow = Array2::<f64>::zeros((2, 2));
        assert!(forest.predict(&narrow).is_err());
    }
}
