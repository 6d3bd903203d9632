use thiserror::Error;

/// Common error type for modelstack with clear taxonomy
#[derive(Error, Debug)]
pub enum Error {
    /// Operator input errors
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Missing things
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Launch command has no {0} flag")]
    MissingFlag(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    /// External collaborator failures
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Orchestrator command failed: {0}")]
    Orchestrator(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Integrity violations: refuse the operation, preserve current state
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("Whitelist state is neither enabled nor disabled; repair the document by hand")]
    WhitelistStateUnknown,

    /// IO and serialization errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic anyhow error for flexibility
    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Get error type for metrics/logging
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::ModelNotFound(_) => "model_not_found",
            Error::MissingFlag(_) => "missing_flag",
            Error::NotFound(_) => "not_found",
            Error::Download(_) => "download",
            Error::Orchestrator(_) => "orchestrator",
            Error::Cancelled(_) => "cancelled",
            Error::Integrity(_) => "integrity",
            Error::WhitelistStateUnknown => "whitelist_state_unknown",
            Error::Io(_) => "io_error",
            Error::Yaml(_) => "yaml_error",
            Error::Anyhow(_) => "unknown",
        }
    }

    /// Errors caused by operator input rather than system state
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::ModelNotFound(_) | Error::NotFound(_)
        )
    }

    /// Errors from an external collaborator (network, container runtime)
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Error::Download(_) | Error::Orchestrator(_) | Error::Io(_)
        )
    }

    /// Errors where the only safe answer is to keep current state untouched
    pub fn is_integrity(&self) -> bool {
        matches!(self, Error::Integrity(_) | Error::WhitelistStateUnknown)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
