use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use flow_detector::config::{DetectorConfig, LoggingConfig};
use flow_detector::Pipeline;

/// Configuration file loaded at startup (extension optional)
const CONFIG_PATH: &str = "config/default";

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from file if available, otherwise use defaults
    let (config, load_error) = match DetectorConfig::from_file(CONFIG_PATH) {
        Ok(config) => (config, None),
        Err(e) => (DetectorConfig::default(), Some(e)),
    };

    init_logging(&config.logging);
    info!("Starting Flow Detector v{}", env!("CARGO_PKG_VERSION"));

    match load_error {
        None => info!("Configuration loaded from {}.toml", CONFIG_PATH),
        Some(e) => warn!("Failed to load config file: {}, using defaults", e),
    }

    config.validate().context("Invalid configuration")?;

    let pipeline = Pipeline::new(config);
    let outcome = pipeline
        .run()
        .await
        .with_context(|| {
            format!(
                "Training run on {} failed",
                pipeline.config().dataset.path.display()
            )
        })?;

    debug!(
        evaluation = %serde_json::to_string(&outcome.evaluation)
            .context("Failed to serialize evaluation")?,
        "Evaluation summary"
    );
    info!(
        accuracy = outcome.evaluation.accuracy,
        auc = outcome.evaluation.auc,
        charts = outcome.plot_paths.len(),
        "Run finished"
    );

    Ok(())
}
