//! CSV dataset loading
//!
//! Reads a headed, comma-separated table into records. Fields that parse
//! fully as numbers become [`Value::Number`]; everything else is kept
//! verbatim as [`Value::Text`].

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::errors::{PipelineError, Result, Stage};

/// A single typed cell
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Coerce a raw field: non-empty strings that parse as numbers become numbers
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Text(String::new());
        }
        match raw.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    /// Numeric value if it is a finite number
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }
}

/// One row, keyed by the dataset header
#[derive(Clone, Debug)]
pub struct Record {
    header: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    /// Value of the first column with this name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.header
            .iter()
            .position(|name| name == column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Value at a header position
    pub fn value_at(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Columns and values in header order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.header.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Ordered, non-empty set of records sharing one header
#[derive(Clone, Debug)]
pub struct Dataset {
    header: Arc<[String]>,
    records: Vec<Record>,
}

impl Dataset {
    /// Load dataset from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PipelineError::io(path, Stage::Load, e))?;

        Self::from_reader(file).map_err(|err| match err {
            // Attach the real path to read failures surfaced by the reader
            PipelineError::Io { source, stage, .. } => PipelineError::io(path, stage, source),
            other => other,
        })
    }

    /// Load dataset from any CSV byte stream
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header: Arc<[String]> = csv_reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        if header.is_empty() || header.iter().all(String::is_empty) {
            return Err(PipelineError::Format("missing header row".to_string()));
        }

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row.map_err(csv_error)?;
            records.push(Record {
                header: Arc::clone(&header),
                values: row.iter().map(Value::parse).collect(),
            });
        }

        if records.is_empty() {
            return Err(PipelineError::Format("no data rows after header".to_string()));
        }

        Ok(Self { header, records })
    }

    /// Column names in source order
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Get number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a loaded dataset
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn csv_error(err: csv::Error) -> PipelineError {
    let line = err.position().map(|p| p.line());
    match err.into_kind() {
        csv::ErrorKind::Io(source) => PipelineError::io("<input>", Stage::Load, source),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => PipelineError::Format(format!(
            "line {}: expected {} fields, found {}",
            line.map_or_else(|| "?".to_string(), |l| l.to_string()),
            expected_len,
            len
        )),
        csv::ErrorKind::Utf8 { err, .. } => PipelineError::Format(format!(
            "line {}: invalid UTF-8: {}",
            line.map_or_else(|| "?".to_string(), |l| l.to_string()),
            err
        )),
        other => PipelineError::Format(format!("{:?}", other)),
    }
}
