//! End-to-end tests for the CSV-to-model pipeline

use std::fs;
use std::path::Path;

use alm_forest_core::{ForestModel, HyperparameterConfig, MaxFeatures, TreeOptions};
use alm_forest_trainer::errors::BoxError;
use alm_forest_trainer::{
    run_pipeline, run_pipeline_with, ColumnSelection, EnsembleTrainer, ModelHandle,
    PipelineConfig, PipelineError, Stage,
};
use anyhow::Result;
use tempfile::TempDir;

fn write_dataset(dir: &Path) -> Result<std::path::PathBuf> {
    let path = dir.join("body.csv");
    let mut text = String::from("Id,Weight,Height,Age,ALM\n");
    for i in 0..40 {
        let weight = 50 + (i * 7) % 40;
        let height = 150 + (i * 3) % 40;
        let age = 20 + i % 50;
        let alm = 0.3 * weight as f64 + 0.1 * height as f64;
        text.push_str(&format!("p{},{},{},{},{:.2}\n", i, weight, height, age, alm));
    }
    // Rows the extractor must drop
    text.push_str("bad1,unknown,170,30,20.0\n");
    text.push_str("bad2,70,172,31,\n");
    fs::write(&path, text)?;
    Ok(path)
}

fn hyperparameters() -> HyperparameterConfig {
    HyperparameterConfig {
        seed: 3,
        max_features: MaxFeatures::Fraction(0.8),
        replacement: true,
        n_estimators: 10,
        tree_options: TreeOptions {
            max_depth: 6,
            min_num_samples: 2,
        },
    }
}

fn config(dir: &TempDir, start: &str, end: &str) -> Result<PipelineConfig> {
    Ok(PipelineConfig {
        source: write_dataset(dir.path())?,
        destination: dir.path().join("model.json"),
        write_hash_file: false,
        columns: ColumnSelection {
            target: "ALM".to_string(),
            start_feature: start.to_string(),
            end_feature: end.to_string(),
        },
        hyperparameters: hyperparameters(),
    })
}

#[test]
fn test_pipeline_end_to_end() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(&dir, "Weight", "Age")?;

    let report = run_pipeline(&config)?;

    assert_eq!(report.rows_loaded, 42);
    assert_eq!(report.rows_used, 40);
    assert_eq!(report.rows_dropped, 2);
    assert_eq!(report.feature_names, ["Weight", "Height", "Age"]);
    assert_eq!(report.bytes_written as u64, fs::metadata(&config.destination)?.len());
    assert!(report.hash_file.is_none());

    let model = ForestModel::load_json(&config.destination)?;
    assert_eq!(model.params, hyperparameters());
    assert_eq!(model.feature_count, 3);
    assert_eq!(model.sample_count, 40);
    assert_eq!(model.num_trees(), 10);

    Ok(())
}

#[test]
fn test_pipeline_is_reproducible() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(&dir, "Weight", "Height")?;

    let first = run_pipeline(&config)?;
    let first_bytes = fs::read(&config.destination)?;
    let second = run_pipeline(&config)?;

    assert_eq!(first.model_digest, second.model_digest);
    assert_eq!(first_bytes, fs::read(&config.destination)?);
    Ok(())
}

#[test]
fn test_hash_file_written_on_request() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = config(&dir, "Weight", "Height")?;
    config.write_hash_file = true;

    let report = run_pipeline(&config)?;

    let hash_file = report.hash_file.expect("hash file requested");
    assert_eq!(fs::read_to_string(hash_file)?, report.model_digest);
    Ok(())
}

#[test]
fn test_invalid_range_writes_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(&dir, "Age", "Weight")?;

    let err = run_pipeline(&config).unwrap_err();

    assert!(matches!(err, PipelineError::InvalidRange { .. }));
    assert_eq!(err.stage(), Stage::Extract);
    assert!(!config.destination.exists());
    Ok(())
}

#[test]
fn test_missing_column_writes_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = config(&dir, "Weight", "Height")?;
    config.columns.target = "LeanMass".to_string();

    let err = run_pipeline(&config).unwrap_err();

    assert_eq!(err.kind(), "ColumnNotFoundError");
    assert!(!config.destination.exists());
    Ok(())
}

#[test]
fn test_missing_source_is_io_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = config(&dir, "Weight", "Height")?;
    config.source = dir.path().join("absent.csv");

    let err = run_pipeline(&config).unwrap_err();

    assert_eq!(err.kind(), "IOError");
    assert_eq!(err.stage(), Stage::Load);
    Ok(())
}

#[test]
fn test_unwritable_destination_is_io_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = config(&dir, "Weight", "Height")?;
    config.destination = dir.path().join("missing").join("model.json");

    let err = run_pipeline(&config).unwrap_err();

    assert_eq!(err.kind(), "IOError");
    assert_eq!(err.stage(), Stage::Persist);
    Ok(())
}

#[test]
fn test_invalid_hyperparameters_surface_as_training_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = config(&dir, "Weight", "Height")?;
    config.hyperparameters.max_features = MaxFeatures::Count(5);

    let err = run_pipeline(&config).unwrap_err();

    assert!(matches!(err, PipelineError::Training(_)));
    assert!(!config.destination.exists());
    Ok(())
}

/// Trainer that hands back fixed bytes, to check they are written verbatim
struct StaticTrainer;

struct StaticModel;

impl ModelHandle for StaticModel {
    fn serialize(&self) -> std::result::Result<Vec<u8>, BoxError> {
        Ok(b"opaque model bytes\n".to_vec())
    }
}

impl EnsembleTrainer for StaticTrainer {
    type Model = StaticModel;
    type Error = std::io::Error;

    fn train(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        _config: &HyperparameterConfig,
    ) -> std::result::Result<StaticModel, std::io::Error> {
        assert_eq!(x.len(), y.len());
        Ok(StaticModel)
    }
}

#[test]
fn test_custom_trainer_output_written_verbatim() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(&dir, "Weight", "Height")?;

    let report = run_pipeline_with(&StaticTrainer, &config)?;

    assert_eq!(fs::read(&config.destination)?, b"opaque model bytes\n");
    assert_eq!(report.bytes_written, 19);
    Ok(())
}
