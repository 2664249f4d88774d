//! Integration tests for the deterministic forest trainer
//!
//! Ensures identical models are produced across multiple runs.

use alm_forest_core::{
    ForestModel, HyperparameterConfig, MaxFeatures, RandomForestRegressor, TreeOptions,
};
use anyhow::Result;

/// Synthetic body-composition style data: target = 0.4 * weight + 10 * height
fn create_synthetic_dataset() -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for i in 0..60 {
        let weight = 50.0 + (i * 7 % 40) as f64;
        let height = 1.5 + (i * 3 % 40) as f64 / 100.0;
        x.push(vec![weight, height]);
        y.push(0.4 * weight + 10.0 * height);
    }
    (x, y)
}

fn config(replacement: bool) -> HyperparameterConfig {
    HyperparameterConfig {
        seed: 3,
        max_features: MaxFeatures::Fraction(0.5),
        replacement,
        n_estimators: 12,
        tree_options: TreeOptions {
            max_depth: 5,
            min_num_samples: 2,
        },
    }
}

#[test]
fn test_cross_run_determinism() -> Result<()> {
    let (x, y) = create_synthetic_dataset();

    let mut json_outputs = Vec::new();
    for _ in 0..3 {
        let model = RandomForestRegressor::new(config(true)).fit(&x, &y)?;
        json_outputs.push(model.to_canonical_json()?);
    }

    for i in 1..json_outputs.len() {
        assert_eq!(
            json_outputs[0], json_outputs[i],
            "JSON output from run {} should match run 0",
            i
        );
    }

    Ok(())
}

#[test]
fn test_determinism_on_single_thread_pool() -> Result<()> {
    let (x, y) = create_synthetic_dataset();
    let parallel = RandomForestRegressor::new(config(true)).fit(&x, &y)?;

    let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build()?;
    let sequential = pool.install(|| RandomForestRegressor::new(config(true)).fit(&x, &y))?;

    assert_eq!(parallel.model_hash, sequential.model_hash);
    Ok(())
}

#[test]
fn test_without_replacement_trains() -> Result<()> {
    let (x, y) = create_synthetic_dataset();
    let model = RandomForestRegressor::new(config(false)).fit(&x, &y)?;

    assert_eq!(model.num_trees(), 12);
    assert!(!model.params.replacement);
    for tree in &model.trees {
        // Every row reaches the root when sampling without replacement
        assert_eq!(tree.nodes[0].samples, x.len());
    }
    Ok(())
}

#[test]
fn test_fit_quality_on_training_data() -> Result<()> {
    let (x, y) = create_synthetic_dataset();
    let model = RandomForestRegressor::new(config(true)).fit(&x, &y)?;

    let preds = model.predict(&x)?;
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let ss_res: f64 = y.iter().zip(&preds).map(|(v, p)| (v - p).powi(2)).sum();

    assert!(ss_res < ss_tot * 0.5, "forest should explain most variance");
    Ok(())
}

#[test]
fn test_reload_preserves_hyperparameters() -> Result<()> {
    let (x, y) = create_synthetic_dataset();
    let model = RandomForestRegressor::new(config(true)).fit(&x, &y)?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("forest.json");
    std::fs::write(&path, model.to_canonical_json()?)?;

    let loaded = ForestModel::load_json(&path)?;
    assert_eq!(loaded.params, config(true));
    assert_eq!(loaded.model_hash, model.model_hash);
    assert_eq!(loaded.predict(&x)?, model.predict(&x)?);

    Ok(())
}
