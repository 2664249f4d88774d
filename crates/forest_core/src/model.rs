//! Random forest model artifact
//!
//! The model carries the hyperparameters it was trained with next to the
//! per-tree structure. Its canonical JSON form is the on-disk format and its
//! BLAKE3 hash identifies the artifact.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{ForestError, Result};
use crate::params::HyperparameterConfig;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json};
use crate::tree::Tree;

/// Current on-disk format version
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Trained random forest regressor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    pub version: u32,
    pub params: HyperparameterConfig,
    pub feature_count: usize,
    pub sample_count: usize,
    pub trees: Vec<Tree>,
    /// BLAKE3 over the canonical JSON of everything except this field
    pub model_hash: String,
}

#[derive(Serialize)]
struct HashedFields<'a> {
    version: u32,
    params: &'a HyperparameterConfig,
    feature_count: usize,
    sample_count: usize,
    trees: &'a [Tree],
}

impl ForestModel {
    pub fn new(
        params: HyperparameterConfig,
        feature_count: usize,
        sample_count: usize,
        trees: Vec<Tree>,
    ) -> Result<Self> {
        let model_hash = Self::calculate_model_hash(
            &params,
            feature_count,
            sample_count,
            &trees,
        )?;

        Ok(Self {
            version: MODEL_FORMAT_VERSION,
            params,
            feature_count,
            sample_count,
            trees,
            model_hash,
        })
    }

    pub fn calculate_model_hash(
        params: &HyperparameterConfig,
        feature_count: usize,
        sample_count: usize,
        trees: &[Tree],
    ) -> Result<String> {
        Ok(hash_canonical_hex(&HashedFields {
            version: MODEL_FORMAT_VERSION,
            params,
            feature_count,
            sample_count,
            trees,
        })?)
    }

    /// Average of all tree outputs for one row
    pub fn predict_row(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.feature_count {
            return Err(ForestError::ShapeMismatch(format!(
                "expected {} features, got {}",
                self.feature_count,
                features.len()
            )));
        }
        if self.trees.is_empty() {
            return Err(ForestError::ValidationFailed("model has no trees".to_string()));
        }

        let mut sum = 0.0;
        for (i, tree) in self.trees.iter().enumerate() {
            sum += tree.evaluate(features).ok_or_else(|| {
                ForestError::ValidationFailed(format!("tree {} has a broken path", i))
            })?;
        }

        Ok(sum / self.trees.len() as f64)
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Validate model structure and hash
    pub fn validate(&self) -> Result<()> {
        if self.version != MODEL_FORMAT_VERSION {
            return Err(ForestError::ValidationFailed(format!(
                "unsupported model version: {}",
                self.version
            )));
        }

        self.params
            .validate()
            .map_err(|e| ForestError::ValidationFailed(e.to_string()))?;

        if self.trees.len() != self.params.n_estimators {
            return Err(ForestError::ValidationFailed(format!(
                "expected {} trees, found {}",
                self.params.n_estimators,
                self.trees.len()
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_count).map_err(|e| {
                ForestError::ValidationFailed(format!("tree {} validation failed: {}", i, e))
            })?;
        }

        let expected = Self::calculate_model_hash(
            &self.params,
            self.feature_count,
            self.sample_count,
            &self.trees,
        )?;
        if expected != self.model_hash {
            return Err(ForestError::ValidationFailed(format!(
                "model hash mismatch: stored {}, computed {}",
                self.model_hash, expected
            )));
        }

        Ok(())
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(to_canonical_json(self)?)
    }

    /// Parse and validate a model from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let model: ForestModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Load and validate a model from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{MaxFeatures, TreeOptions};
    use crate::tree::Node;

    fn params(n_estimators: usize) -> HyperparameterConfig {
        HyperparameterConfig {
            seed: 7,
            max_features: MaxFeatures::Fraction(0.8),
            replacement: true,
            n_estimators,
            tree_options: TreeOptions {
                max_depth: 4,
                min_num_samples: 1,
            },
        }
    }

    fn create_test_model() -> ForestModel {
        let tree1 = Tree::new(vec![
            Node::internal(0, 0, 50.0, 1, 2, 4),
            Node::leaf(1, 100.0, 2),
            Node::leaf(2, 200.0, 2),
        ]);
        let tree2 = Tree::new(vec![
            Node::internal(0, 1, 30.0, 1, 2, 4),
            Node::leaf(1, 0.0, 2),
            Node::leaf(2, 50.0, 2),
        ]);

        ForestModel::new(params(2), 2, 4, vec![tree1, tree2]).unwrap()
    }

    #[test]
    fn test_model_creation() {
        let model = create_test_model();
        assert_eq!(model.version, MODEL_FORMAT_VERSION);
        assert_eq!(model.num_trees(), 2);
        assert_eq!(model.model_hash.len(), 64);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_predict_averages_trees() {
        let model = create_test_model();
        // tree1 -> 100, tree2 -> 50
        assert_eq!(model.predict_row(&[10.0, 40.0]).unwrap(), 75.0);
        assert!(model.predict_row(&[10.0]).is_err());
    }

    #[test]
    fn test_canonical_json_roundtrip() {
        let model = create_test_model();
        let json = model.to_canonical_json().unwrap();
        assert!(!json.contains('\n'));

        let loaded = ForestModel::from_json(&json).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.params, params(2));
    }

    #[test]
    fn test_tampered_model_rejected() {
        let mut model = create_test_model();
        model.trees[0].nodes[1].leaf = Some(999.0);
        let json = serde_json::to_string(&model).unwrap();

        assert!(matches!(
            ForestModel::from_json(&json),
            Err(ForestError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_tree_count_must_match_params() {
        let mut model = create_test_model();
        model.params.n_estimators = 3;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_load_json_from_file() {
        let model = create_test_model();
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), model.to_canonical_json().unwrap()).unwrap();

        let loaded = ForestModel::load_json(file.path()).unwrap();
        assert_eq!(loaded.model_hash, model.model_hash);
    }
}
