use modelstack_common::{Error, Result};
use std::path::PathBuf;

/// File extension that marks a model file in the store
pub const MODEL_EXTENSION: &str = "gguf";

/// The set of model files present in the model store.
///
/// Grows when a download completes; nothing else writes here. Reads go to
/// the filesystem every time so a freshly downloaded file shows up without
/// any cache invalidation.
#[derive(Debug, Clone)]
pub struct ModelInventory {
    dir: PathBuf,
}

impl ModelInventory {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Model file names, sorted for stable menu numbering
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("model store {}", self.dir.display()))
            } else {
                e.into()
            }
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_model = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(MODEL_EXTENSION))
                .unwrap_or(false);
            if !is_model {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|n| n == name))
    }
}
