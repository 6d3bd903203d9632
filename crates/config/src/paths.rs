use modelstack_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Every filesystem location the deployment touches, resolved once from the
/// operator's home directory and handed to components explicitly.
#[derive(Debug, Clone)]
pub struct InstallPaths {
    root: PathBuf,
}

impl InstallPaths {
    /// Resolve the standard installation root under the home directory
    pub fn resolve() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::NotFound("home directory".to_string()))?;
        Ok(Self::at(home.join(".local/share/modelstack")))
    }

    /// Use an explicit root (tests, non-standard installs)
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Model store directory
    pub fn model_dir(&self) -> PathBuf {
        self.root.join("models")
    }

    /// Data directory mounted into the UI service
    pub fn ui_data_dir(&self) -> PathBuf {
        self.root.join("ui-data")
    }

    /// Scratch space for update candidates
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Versioned deployment definition the compose document is rendered from
    pub fn definition_file(&self) -> PathBuf {
        self.root.join("definition.yaml")
    }

    /// Rendered compose document handed to the orchestrator
    pub fn compose_file(&self) -> PathBuf {
        self.root.join("compose.yaml")
    }

    /// Launch command for the inference service
    pub fn launch_file(&self) -> PathBuf {
        self.root.join("launch.conf")
    }

    /// UI access whitelist
    pub fn whitelist_file(&self) -> PathBuf {
        self.root.join("whitelist.conf")
    }

    /// Marker left while an update swap is in flight
    pub fn pending_update_marker(&self) -> PathBuf {
        self.root.join("update.pending")
    }

    /// Host path of a model file in the store
    pub fn model_path(&self, file_name: &str) -> PathBuf {
        self.model_dir().join(file_name)
    }
}
