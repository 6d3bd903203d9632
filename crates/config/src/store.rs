//! Whole-document reads and writes for the configuration files.
//!
//! Writes go through a temp file and a rename so a failure mid-write can
//! never leave a half-committed document behind.

use modelstack_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Read a document in full
pub fn load(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::NotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Replace a document atomically
pub fn save_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = tmp_path(path)?;
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Validation(format!("unusable document path: {}", path.display())))?;
    Ok(path.with_file_name(format!("{name}.tmp")))
}
