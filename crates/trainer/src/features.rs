//! Feature extraction
//!
//! Resolves an inclusive `start..=end` column range plus a target column
//! against the dataset header and keeps only rows whose selected values are
//! all finite numbers.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::dataset::Dataset;
use crate::errors::{PipelineError, Result};

/// Which columns feed the model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub target: String,
    pub start_feature: String,
    pub end_feature: String,
}

/// Cleaned training data
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSet {
    /// Header slice `start..=end`, in header order
    pub names: Vec<String>,
    /// One row per retained record, `names.len()` values each
    pub matrix: Vec<Vec<f64>>,
    /// Target per retained record, aligned with `matrix`
    pub targets: Vec<f64>,
    /// Records dropped for non-numeric values
    pub dropped_rows: usize,
}

/// Summary statistics for one feature column
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureStats {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// Get feature statistics for validation
    pub fn feature_stats(&self) -> Vec<FeatureStats> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                let mut sum = 0.0;
                for row in &self.matrix {
                    min = min.min(row[i]);
                    max = max.max(row[i]);
                    sum += row[i];
                }
                FeatureStats {
                    name: name.clone(),
                    min,
                    max,
                    mean: sum / self.matrix.len().max(1) as f64,
                }
            })
            .collect()
    }
}

/// Build the feature matrix and target vector for a column selection.
///
/// Column checks run against the header before any row is inspected. Rows
/// holding a non-numeric or non-finite value in a selected column are
/// skipped; the relative order of the remaining rows is preserved.
pub fn extract_features(dataset: &Dataset, columns: &ColumnSelection) -> Result<FeatureSet> {
    let header = dataset.header();
    let position = |name: &str| header.iter().position(|column| column == name);

    let start = position(&columns.start_feature);
    let end = position(&columns.end_feature);
    let target = position(&columns.target);

    let (start_idx, end_idx, target_idx) = match (start, end, target) {
        (Some(s), Some(e), Some(t)) => (s, e, t),
        _ => {
            let mut missing = Vec::new();
            for (name, found) in [
                (&columns.start_feature, start),
                (&columns.end_feature, end),
                (&columns.target, target),
            ] {
                if found.is_none() && !missing.contains(name) {
                    missing.push(name.clone());
                }
            }
            return Err(PipelineError::ColumnNotFound { columns: missing });
        }
    };

    if start_idx > end_idx {
        return Err(PipelineError::InvalidRange {
            start: columns.start_feature.clone(),
            end: columns.end_feature.clone(),
            start_index: start_idx,
            end_index: end_idx,
        });
    }

    if (start_idx..=end_idx).contains(&target_idx) {
        warn!(
            "Target column '{}' lies inside the feature range and will be used as a feature too",
            columns.target
        );
    }

    let names = header[start_idx..=end_idx].to_vec();
    let mut matrix = Vec::with_capacity(dataset.len());
    let mut targets = Vec::with_capacity(dataset.len());
    let mut dropped_rows = 0;

    for (row_idx, record) in dataset.records().iter().enumerate() {
        let row: Option<Vec<f64>> = (start_idx..=end_idx)
            .map(|idx| record.value_at(idx).and_then(|v| v.as_finite()))
            .collect();
        let target_value = record.value_at(target_idx).and_then(|v| v.as_finite());

        match (row, target_value) {
            (Some(row), Some(y)) => {
                matrix.push(row);
                targets.push(y);
            }
            _ => {
                trace!("Dropping row {}: non-numeric feature or target", row_idx + 1);
                dropped_rows += 1;
            }
        }
    }

    if matrix.is_empty() {
        return Err(PipelineError::NoValidData { rows: dataset.len() });
    }

    debug!(
        "Extracted {} rows x {} features ({} dropped)",
        matrix.len(),
        names.len(),
        dropped_rows
    );

    Ok(FeatureSet {
        names,
        matrix,
        targets,
        dropped_rows,
    })
}
