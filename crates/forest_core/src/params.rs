//! Hyperparameters for random forest regression
//!
//! Field names are snake_case; the camelCase spellings (`maxFeatures`,
//! `nEstimators`, `treeOptions.minNumSamples`, ...) are accepted as aliases.

use serde::{Deserialize, Serialize};

use crate::errors::{ForestError, Result};

/// Number of features examined when searching for a split.
///
/// Integers are read as an absolute count, floats as a fraction of the
/// available features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxFeatures {
    Count(usize),
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolve against the number of available features.
    pub fn resolve(&self, n_features: usize) -> Result<usize> {
        if n_features == 0 {
            return Err(ForestError::InvalidParameters(
                "no features to select from".to_string(),
            ));
        }

        match *self {
            MaxFeatures::Count(0) => Err(ForestError::InvalidParameters(
                "max_features must be at least 1".to_string(),
            )),
            MaxFeatures::Count(n) if n > n_features => {
                Err(ForestError::InvalidParameters(format!(
                    "max_features ({}) exceeds the number of features ({})",
                    n, n_features
                )))
            }
            MaxFeatures::Count(n) => Ok(n),
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                Err(ForestError::InvalidParameters(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )))
            }
            MaxFeatures::Fraction(f) => {
                let n = (f * n_features as f64).floor() as usize;
                Ok(n.clamp(1, n_features))
            }
        }
    }
}

impl Default for MaxFeatures {
    fn default() -> Self {
        MaxFeatures::Fraction(1.0)
    }
}

/// Per-tree growth limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeOptions {
    #[serde(alias = "maxDepth")]
    pub max_depth: usize,
    /// Minimum number of samples in every leaf
    #[serde(alias = "minNumSamples")]
    pub min_num_samples: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_num_samples: 3,
        }
    }
}

/// Full training configuration for a forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterConfig {
    pub seed: u64,
    #[serde(alias = "maxFeatures")]
    pub max_features: MaxFeatures,
    /// Bootstrap with replacement
    pub replacement: bool,
    #[serde(alias = "nEstimators")]
    pub n_estimators: usize,
    #[serde(alias = "treeOptions")]
    pub tree_options: TreeOptions,
}

impl Default for HyperparameterConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_features: MaxFeatures::default(),
            replacement: true,
            n_estimators: 50,
            tree_options: TreeOptions::default(),
        }
    }
}

impl HyperparameterConfig {
    /// Check values that do not depend on the data shape.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForestError::InvalidParameters(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.tree_options.min_num_samples == 0 {
            return Err(ForestError::InvalidParameters(
                "tree_options.min_num_samples must be at least 1".to_string(),
            ));
        }
        match self.max_features {
            MaxFeatures::Count(0) => Err(ForestError::InvalidParameters(
                "max_features must be at least 1".to_string(),
            )),
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                Err(ForestError::InvalidParameters(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_count_and_fraction() {
        assert_eq!(MaxFeatures::Count(2).resolve(5).unwrap(), 2);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(5).unwrap(), 2);
        assert_eq!(MaxFeatures::Fraction(1.0).resolve(5).unwrap(), 5);
        // Never rounds down to zero features
        assert_eq!(MaxFeatures::Fraction(0.1).resolve(3).unwrap(), 1);
    }

    #[test]
    fn test_resolve_rejects_out_of_range() {
        assert!(MaxFeatures::Count(0).resolve(3).is_err());
        assert!(MaxFeatures::Count(4).resolve(3).is_err());
        assert!(MaxFeatures::Fraction(0.0).resolve(3).is_err());
        assert!(MaxFeatures::Fraction(1.5).resolve(3).is_err());
        assert!(MaxFeatures::Fraction(f64::NAN).resolve(3).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(HyperparameterConfig::default().validate().is_ok());

        let mut params = HyperparameterConfig::default();
        params.n_estimators = 0;
        assert!(params.validate().is_err());

        let mut params = HyperparameterConfig::default();
        params.tree_options.min_num_samples = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_camel_case_aliases() {
        let json = r#"{
            "seed": 3,
            "maxFeatures": 2,
            "replacement": false,
            "nEstimators": 200,
            "treeOptions": { "maxDepth": 8, "minNumSamples": 5 }
        }"#;
        let params: HyperparameterConfig = serde_json::from_str(json).unwrap();

        assert_eq!(params.seed, 3);
        assert_eq!(params.max_features, MaxFeatures::Count(2));
        assert!(!params.replacement);
        assert_eq!(params.n_estimators, 200);
        assert_eq!(params.tree_options.max_depth, 8);
        assert_eq!(params.tree_options.min_num_samples, 5);
    }

    #[test]
    fn test_fraction_deserializes_as_fraction() {
        let mf: MaxFeatures = serde_json::from_str("0.8").unwrap();
        assert_eq!(mf, MaxFeatures::Fraction(0.8));
        let mf: MaxFeatures = serde_json::from_str("1.0").unwrap();
        assert_eq!(mf, MaxFeatures::Fraction(1.0));
    }
}
