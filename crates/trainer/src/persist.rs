//! Model persistence
//!
//! Bytes are written to a temp file beside the destination, synced and then
//! renamed over it, so a failed write never leaves a truncated model behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use alm_forest_core::blake3_hex;
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::{PipelineError, Result, Stage};
use crate::trainer::ModelHandle;

/// Outcome of a successful write
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedModel {
    pub path: PathBuf,
    pub bytes_written: usize,
    /// BLAKE3 of the written bytes
    pub digest: String,
}

/// Serialize `model` and atomically replace `destination` with the bytes.
///
/// The destination's directory must already exist.
pub fn persist_model<M: ModelHandle>(model: &M, destination: &Path) -> Result<PersistedModel> {
    let bytes = model.serialize().map_err(PipelineError::Serialization)?;
    write_atomic(destination, &bytes)?;

    let persisted = PersistedModel {
        path: destination.to_path_buf(),
        bytes_written: bytes.len(),
        digest: blake3_hex(&bytes),
    };
    info!(
        "Model written to {} ({} bytes)",
        persisted.path.display(),
        persisted.bytes_written
    );

    Ok(persisted)
}

/// Write the hex digest next to the model as `<destination>.blake3`
pub fn write_hash_file(persisted: &PersistedModel) -> Result<PathBuf> {
    let mut name = persisted.path.as_os_str().to_owned();
    name.push(".blake3");
    let hash_path = PathBuf::from(name);

    write_atomic(&hash_path, persisted.digest.as_bytes())?;
    info!("Hash written to {}", hash_path.display());

    Ok(hash_path)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |e| PipelineError::io(path, Stage::Persist, e);

    if fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false) {
        return Err(io_err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "destination is a directory",
        )));
    }

    let mut temp = NamedTempFile::new_in(parent).map_err(io_err)?;
    temp.write_all(bytes).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}
