// Stratified Train/Test Splitter
//
// Partitions row indices so that each class keeps its share of the dataset
// in both subsets. Per-class test quotas use largest-remainder rounding, which
// keeps every quota within one row of its exact proportional value. All
// shuffling is driven by a seeded ChaCha generator so identical labels and
// seed always give identical partitions.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::error::{DetectorError, Result};

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Seeded stratified splitter
#[derive(Debug, Clone, Copy)]
pub struct StratifiedSplit {
    test_size: f64,
    seed: u64,
}

impl StratifiedSplit {
    pub fn new(test_size: f64, seed: u64) -> Self {
        Self { test_size, seed }
    }

    /// Number of test rows for `n` samples
    pub fn test_count(&self, n: usize) -> usize {
        (self.test_size * n as f64).ceil() as usize
    }

    /// Partition the rows of `labels`
    pub fn split(&self, labels: &[u8]) -> Result<SplitIndices> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(DetectorError::Config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }

        let n = labels.len();
        let mut classes: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
        for (row, &label) in labels.iter().enumerate() {
            classes.entry(label).or_default().push(row);
        }

        if classes.len() < 2 {
            return Err(DetectorError::Data(format!(
                "stratified split needs two label classes, found {}",
                classes.len()
            )));
        }

        if let Some((label, rows)) = classes.iter().find(|(_, rows)| rows.len() < 2) {
            return Err(DetectorError::Data(format!(
                "class {} has {} row(s); stratification needs at least 2",
                label,
                rows.len()
            )));
        }

        let n_test = self.test_count(n);
        let n_train = n - n_test.min(n);
        if n_test < classes.len() || n_train < classes.len() {
            return Err(DetectorError::Data(format!(
                "split of {} rows into {} train / {} test cannot hold {} classes",
                n,
                n_train,
                n_test,
                classes.len()
            )));
        }

        let quotas = allocate_quotas(&classes, n, n_test);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train = Vec::with_capacity(n_train);
        let mut test = Vec::with_capacity(n_test);

        for (rows, quota) in classes.into_values().zip(quotas) {
            let mut rows = rows;
            rows.shuffle(&mut rng);
            let (class_test, class_train) = rows.split_at(quota);
            test.extend_from_slice(class_test);
            train.extend_from_slice(class_train);
        }

        train.shuffle(&mut rng);
        test.shuffle(&mut rng);

        info!(
            train = train.len(),
            test = test.len(),
            seed = self.seed,
            "Stratified train/test split"
        );
        Ok(SplitIndices { train, test })
    }
}

/// Largest-remainder apportionment of `n_test` rows across classes
fn allocate_quotas(classes: &BTreeMap<u8, Vec<usize>>, n: usize, n_test: usize) -> Vec<usize> {
    let exact: Vec<f64> = classes
        .values()
        .map(|rows| rows.len() as f64 * n_test as f64 / n as f64)
        .collect();

    let mut quotas: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let assigned: usize = quotas.iter().sum();

    let mut by_remainder: Vec<usize> = (0..exact.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
    });

    for &class in by_remainder.iter().take(n_test.saturating_sub(assigned)) {
        quotas[class] += 1;
    }
    quotas
}
