//! Offline training entry point
//!
//! Reads the raw flight history, derives features and delay labels, fits the
//! classifier and writes the model artifact the server loads at startup.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use delay_backend::dataset::load_training_records;
use delay_backend::encoder::DEFAULT_TARGET;
use delay_backend::{init_logging, AppConfig, DelayModel};

#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Train the flight delay classifier", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Raw flight history CSV (overrides training.data_path)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Where to write the model artifact (overrides model.path)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Name of the derived label column
    #[arg(long, default_value = DEFAULT_TARGET)]
    target: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = AppConfig::load_or_default(&cli.config)?.with_env_overrides()?;
    if let Some(data) = cli.data {
        config.training.data_path = data;
    }
    if let Some(model) = cli.model {
        config.model.path = model;
    }
    config.validate()?;

    let records = load_training_records(&config.training.data_path).with_context(|| {
        format!(
            "failed to read training data from {}",
            config.training.data_path.display()
        )
    })?;

    // Always train from scratch; an existing artifact is overwritten
    let mut model = DelayModel::new(&config.model.path, config.training.clone());
    let (features, target) = model.preprocess_with_target(&records, &cli.target);
    let delayed = target.values.iter().filter(|&&v| v == 1).count();
    info!(
        "encoded {} rows x {} features; {} of {} labelled `{}`",
        features.nrows(),
        features.ncols(),
        delayed,
        target.values.len(),
        target.name
    );

    let report = model.fit(&features, &target.values).context("training failed")?;
    info!(
        "validation split: {} rows; holdout accuracy {:.4} (trained on {}); model written to {}",
        report.holdout_rows,
        report.report.accuracy,
        report.train_rows,
        model.model_path().display()
    );
    Ok(())
}
