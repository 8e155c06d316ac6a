//! End-to-end tests for the detector pipeline
//!
//! Synthetic EdgeIIoT-style CSV files are written to temporary directories and
//! driven through every stage: loading, cleaning, label binarization,
//! encoding, stratified split, scaling, forest training and reporting.

use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::Axis;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

use flow_detector::config::{DetectorConfig, MaxFeatures};
use flow_detector::pipeline::{Dataset, Pipeline};
use flow_detector::DetectorError;

const PROTOCOLS: [&str; 3] = ["tcp", "udp", "icmp"];

/// 100 rows: id, timestamp, five numeric features, one protocol column and a
/// label with 80 "Normal" and 20 attack rows
fn write_synthetic_csv(dir: &Path) -> PathBuf {
    let path = dir.join("flows.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    writeln!(
        file,
        "id,timestamp,tcp.len,tcp.ack,udp.port,mqtt.len,dns.qry,proto,label"
    )
    .unwrap();

    for i in 0..100 {
        let attack = i % 5 == 0;
        let label = if attack {
            ["DDoS_UDP", "Backdoor", "Port_Scanning", "Ransomware"][i % 4]
        } else {
            "Normal"
        };
        let shift = if attack { 40.0 } else { 0.0 };
        let len: f64 = rng.gen_range(0.0..20.0) + shift;
        // A few missing cells exercise the imputer
        let ack = if i % 17 == 3 {
            String::new()
        } else {
            format!("{:.3}", rng.gen_range(0.0..1.0) + shift / 10.0)
        };
        writeln!(
            file,
            "{},{}.0,{:.3},{},{},{:.2},{},{},{}",
            i,
            1_600_000_000 + i,
            len,
            ack,
            rng.gen_range(1000..2000),
            rng.gen_range(0.0..5.0),
            rng.gen_range(0..3),
            PROTOCOLS[i % 3],
            label
        )
        .unwrap();
    }
    path
}

fn config_for(dataset: &Path, out: &Path) -> DetectorConfig {
    let mut config = DetectorConfig::default();
    config.dataset.path = dataset.to_path_buf();
    config.report.output_dir = out.join("reports");
    config.forest.n_jobs = 2;
    config
}

fn fixture() -> (TempDir, DetectorConfig) {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_synthetic_csv(dir.path());
    let config = config_for(&csv, dir.path());
    (dir, config)
}

#[tokio::test]
async fn test_end_to_end_synthetic_run() {
    let (_dir, config) = fixture();
    let output_dir = config.report.output_dir.clone();

    let outcome = Pipeline::new(config).run().await.unwrap();

    assert_eq!(outcome.y_test.len(), 25);
    let positives = outcome.y_test.iter().filter(|&&y| y == 1).count();
    assert!((4..=6).contains(&positives), "positives = {}", positives);

    let eval = &outcome.evaluation;
    assert!((0.0..=1.0).contains(&eval.accuracy));
    assert!((0.0..=1.0).contains(&eval.auc));
    assert_eq!(eval.per_class[0].support + eval.per_class[1].support, 25);

    assert_eq!(outcome.plot_paths.len(), 2);
    assert!(output_dir.join("confusion_matrix.svg").exists());
    assert!(output_dir.join("roc_curve.svg").exists());
}

#[test]
fn test_prepare_split_sizes_and_stratification() {
    let (_dir, config) = fixture();
    let pipeline = Pipeline::new(config);
    let dataset = pipeline.load().unwrap();
    let n_rows = dataset.n_rows();

    let data = pipeline.prepare(dataset).unwrap();

    assert_eq!(data.y_train.len() + data.y_test.len(), n_rows);
    assert_eq!(data.y_test.len(), 25);
    assert_eq!(data.y_train.len(), 75);

    let overall = 20.0 / 100.0;
    let train_frac =
        data.y_train.iter().filter(|&&y| y == 1).count() as f64 / data.y_train.len() as f64;
    let test_frac =
        data.y_test.iter().filter(|&&y| y == 1).count() as f64 / data.y_test.len() as f64;
    assert!((train_frac - overall).abs() <= 1.0 / data.y_train.len() as f64);
    assert!((test_frac - overall).abs() <= 1.0 / data.y_test.len() as f64);

    // id and timestamp dropped, label removed: 5 numeric + proto
    assert_eq!(data.feature_names.len(), 6);
    assert!(!data.feature_names.iter().any(|n| n == "id" || n == "timestamp"));
    assert_eq!(data.x_train.ncols(), data.x_test.ncols());
}

#[test]
fn test_scaled_train_has_unit_statistics() {
    let (_dir, config) = fixture();
    let pipeline = Pipeline::new(config);
    let data = pipeline.prepare(pipeline.load().unwrap()).unwrap();

    for column in data.x_train.axis_iter(Axis(1)) {
        assert!(column.mean().unwrap().abs() < 1e-9);
        assert!((column.std(0.0) - 1.0).abs() < 1e-9);
    }

    // Test rows are scaled with the statistics fitted on train rows
    assert_eq!(data.scaler.mean().len(), data.x_test.ncols());
    assert_eq!(data.scaler.std().len(), data.x_test.ncols());
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let (_dir, mut config) = fixture();
    config.report.plots = false;

    let first = Pipeline::new(config.clone()).run().await.unwrap();
    let second = Pipeline::new(config).run().await.unwrap();

    assert_eq!(first.predictions, second.predictions);
    assert_eq!(first.probabilities, second.probabilities);
    assert_eq!(first.evaluation.accuracy, second.evaluation.accuracy);
}

#[tokio::test]
async fn test_worker_count_does_not_change_results() {
    let (_dir, mut config) = fixture();
    config.report.plots = false;
    config.forest.n_trees = 30;

    config.forest.n_jobs = 1;
    let single = Pipeline::new(config.clone()).run().await.unwrap();
    config.forest.n_jobs = 4;
    let parallel = Pipeline::new(config).run().await.unwrap();

    assert_eq!(single.probabilities, parallel.probabilities);
}

#[test]
fn test_train_only_fitting_keeps_partition() {
    let (_dir, config) = fixture();
    let mut guarded = config.clone();
    guarded.preprocessing.fit_on_train_only = true;

    let parity = Pipeline::new(config);
    let guarded = Pipeline::new(guarded);

    let a = parity.prepare(parity.load().unwrap()).unwrap();
    let b = guarded.prepare(guarded.load().unwrap()).unwrap();

    assert_eq!(a.split, b.split);
    assert_eq!(a.y_test, b.y_test);
    assert_eq!(a.feature_names, b.feature_names);
}

#[tokio::test]
async fn test_default_forest_generalizes() {
    let (_dir, mut config) = fixture();
    config.report.plots = false;
    assert_eq!(config.forest.max_features, MaxFeatures::Sqrt);

    let outcome = Pipeline::new(config).run().await.unwrap();
    let eval = &outcome.evaluation;
    assert!(eval.accuracy > 0.9, "accuracy = {}", eval.accuracy);
    assert!(eval.per_class[1].recall >= 0.8, "recall = {}", eval.per_class[1].recall);
    assert!(eval.auc > 0.95, "auc = {}", eval.auc);
}

#[tokio::test]
async fn test_all_feature_subsets() {
    let (_dir, mut config) = fixture();
    config.report.plots = false;
    config.forest.n_trees = 20;
    config.forest.max_features = MaxFeatures::All;

    let outcome = Pipeline::new(config).run().await.unwrap();
    // Attack rows are shifted far from normal rows
    assert!(outcome.evaluation.accuracy > 0.9);
}

#[test]
fn test_single_class_dataset_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("normal_only.csv");
    let mut csv = String::from("bytes,label\n");
    for i in 0..20 {
        csv.push_str(&format!("{},normal\n", i));
    }
    std::fs::write(&path, csv).unwrap();

    let config = config_for(&path, dir.path());
    let pipeline = Pipeline::new(config);
    let err = pipeline.prepare(pipeline.load().unwrap()).unwrap_err();
    assert!(matches!(err, DetectorError::Data(_)));
}

#[tokio::test]
async fn test_no_feature_columns_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labels_only.csv");
    let mut csv = String::from("id,label\n");
    for i in 0..20 {
        csv.push_str(&format!("{},{}\n", i, if i % 2 == 0 { "Normal" } else { "XSS" }));
    }
    std::fs::write(&path, csv).unwrap();

    let mut config = config_for(&path, dir.path());
    config.report.plots = false;
    let err = Pipeline::new(config).run().await.unwrap_err();
    assert!(matches!(err, DetectorError::Fit(_)));
}

#[test]
fn test_missing_dataset_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir.path().join("absent.csv"), dir.path());
    let err = Pipeline::new(config).load().unwrap_err();
    assert!(matches!(err, DetectorError::Input(_)));
}

#[test]
fn test_missing_label_column_is_fatal() {
    let csv = "a,b\n1,2\n3,4\n";
    let err = Dataset::from_reader(csv.as_bytes(), "label").unwrap_err();
    assert!(matches!(err, DetectorError::Input(_)));
}
