//! ALM Forest Core - deterministic random forest regression
//!
//! Trains bagged CART regression trees with reproducible sampling and
//! produces hashable canonical JSON model artifacts.

pub mod cart;
pub mod deterministic;
pub mod errors;
pub mod forest;
pub mod model;
pub mod params;
pub mod serde_canon;
pub mod tree;

pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::ForestError;
pub use forest::RandomForestRegressor;
pub use model::{ForestModel, MODEL_FORMAT_VERSION};
pub use params::{HyperparameterConfig, MaxFeatures, TreeOptions};
pub use serde_canon::{blake3_hex, to_canonical_json};
pub use tree::{Node, Tree};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
