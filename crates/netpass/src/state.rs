//! JSON state file holding the engine's stores between invocations.

use std::path::Path;

use netpass_core::{MemoryStore, StoreSnapshot};

use crate::error::CliError;

/// Load the store image at `path`. A missing file is an empty store.
pub fn load(path: &Path) -> Result<MemoryStore, CliError> {
    let snapshot = match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<StoreSnapshot>(&raw).map_err(|e| state_error(path, e))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no state file, starting empty");
            StoreSnapshot::default()
        }
        Err(e) => return Err(e.into()),
    };
    MemoryStore::from_snapshot(snapshot).map_err(|e| state_error(path, e))
}

/// Write the store image to `path` through a sibling temp file and rename,
/// so a crash mid-write leaves the previous state intact.
pub fn save(path: &Path, store: &MemoryStore) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(&store.snapshot())?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}

fn state_error(path: &Path, err: impl std::fmt::Display) -> CliError {
    CliError::State {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
