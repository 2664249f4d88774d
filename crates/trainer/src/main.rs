//! ALM Forest Trainer CLI
//!
//! Trains a random forest regressor from a CSV file and writes the model as
//! canonical JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use alm_forest_core::{ForestModel, HyperparameterConfig, MaxFeatures};
use alm_forest_trainer::{
    run_pipeline, ColumnSelection, PipelineConfig, PipelineError, PipelineReport,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "forest-trainer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a random forest regressor from a CSV file", long_about = None)]
struct Args {
    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input CSV dataset path (header row required)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output path for the model JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target column name
    #[arg(long)]
    target: Option<String>,

    /// First feature column (inclusive)
    #[arg(long)]
    start_feature: Option<String>,

    /// Last feature column (inclusive)
    #[arg(long)]
    end_feature: Option<String>,

    /// Random seed [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Features per split: an integer count or a fraction such as 0.8 [default: 1.0]
    #[arg(long, value_parser = parse_max_features)]
    max_features: Option<MaxFeatures>,

    /// Bootstrap without replacement
    #[arg(long)]
    no_replacement: bool,

    /// Number of trees [default: 50]
    #[arg(long)]
    trees: Option<usize>,

    /// Maximum tree depth [default: 10]
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum samples per leaf [default: 3]
    #[arg(long)]
    min_samples: Option<usize>,

    /// Also write <output>.blake3 with the model digest
    #[arg(long)]
    hash_file: bool,

    /// Reload the written model and check its hyperparameters
    #[arg(long)]
    verify: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_max_features(raw: &str) -> std::result::Result<MaxFeatures, String> {
    if raw.contains(['.', 'e', 'E']) {
        raw.parse::<f64>()
            .map(MaxFeatures::Fraction)
            .map_err(|e| format!("invalid fraction '{}': {}", raw, e))
    } else {
        raw.parse::<usize>()
            .map(MaxFeatures::Count)
            .map_err(|e| format!("invalid count '{}': {}", raw, e))
    }
}

/// Merge the config file (if any) with command-line overrides
fn build_config(args: &Args) -> std::result::Result<PipelineConfig, PipelineError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => {
            let missing: Vec<&str> = [
                ("--input", args.input.is_none()),
                ("--output", args.output.is_none()),
                ("--target", args.target.is_none()),
                ("--start-feature", args.start_feature.is_none()),
                ("--end-feature", args.end_feature.is_none()),
            ]
            .into_iter()
            .filter_map(|(flag, absent)| absent.then_some(flag))
            .collect();
            if !missing.is_empty() {
                return Err(PipelineError::Config(format!(
                    "missing required option(s) without --config: {}",
                    missing.join(", ")
                )));
            }

            PipelineConfig {
                source: PathBuf::new(),
                destination: PathBuf::new(),
                write_hash_file: false,
                columns: ColumnSelection {
                    target: String::new(),
                    start_feature: String::new(),
                    end_feature: String::new(),
                },
                hyperparameters: HyperparameterConfig::default(),
            }
        }
    };

    if let Some(input) = &args.input {
        config.source = input.clone();
    }
    if let Some(output) = &args.output {
        config.destination = output.clone();
    }
    if let Some(target) = &args.target {
        config.columns.target = target.clone();
    }
    if let Some(start) = &args.start_feature {
        config.columns.start_feature = start.clone();
    }
    if let Some(end) = &args.end_feature {
        config.columns.end_feature = end.clone();
    }

    let params = &mut config.hyperparameters;
    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    if let Some(max_features) = args.max_features {
        params.max_features = max_features;
    }
    if args.no_replacement {
        params.replacement = false;
    }
    if let Some(trees) = args.trees {
        params.n_estimators = trees;
    }
    if let Some(depth) = args.max_depth {
        params.tree_options.max_depth = depth;
    }
    if let Some(min_samples) = args.min_samples {
        params.tree_options.min_num_samples = min_samples;
    }
    config.write_hash_file |= args.hash_file;

    config.validate()?;
    Ok(config)
}

/// Reload the persisted model and compare its hyperparameters
fn verify_model(path: &Path, expected: &HyperparameterConfig) -> Result<()> {
    let model = ForestModel::load_json(path)
        .with_context(|| format!("Failed to reload model from {}", path.display()))?;

    if &model.params != expected {
        bail!(
            "hyperparameters in {} differ from the training configuration",
            path.display()
        );
    }

    info!("Verified {} ({} trees, hash {})", path.display(), model.num_trees(), model.model_hash);
    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn log_report(report: &PipelineReport) {
    info!("✓ Training completed successfully");
    info!(
        "  Rows: {} loaded, {} used, {} dropped",
        report.rows_loaded, report.rows_used, report.rows_dropped
    );
    info!("  Model: {} ({} bytes)", report.destination.display(), report.bytes_written);
    info!("  BLAKE3: {}", report.model_digest);
    if let Some(hash_file) = &report.hash_file {
        info!("  Hash file: {}", hash_file.display());
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = init_tracing(args.verbose) {
        eprintln!("{:#}", err);
        return ExitCode::FAILURE;
    }

    info!("ALM Forest Trainer v{}", env!("CARGO_PKG_VERSION"));

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!("[{}] {}: {}", err.stage(), err.kind(), err);
            return ExitCode::FAILURE;
        }
    };

    let report = match run_pipeline(&config) {
        Ok(report) => report,
        Err(err) => {
            error!("[{}] {}: {}", err.stage(), err.kind(), err);
            return ExitCode::FAILURE;
        }
    };

    log_report(&report);

    if args.verify {
        if let Err(err) = verify_model(&report.destination, &config.hyperparameters) {
            error!("[verify] {:#}", err);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
