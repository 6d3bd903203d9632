use crate::fetch::RemoteSource;
use crate::stack::StackDefinition;
use crate::template::{render, Substitutions};
use modelstack_common::{Error, Result};
use modelstack_config::{store, InstallPaths};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const MAGIC_PREFIX: &str = "# modelstack-deploy v";
const CANDIDATE_FILE: &str = "definition.yaml";

/// Version carried in a definition's header line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DefinitionVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl DefinitionVersion {
    fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().splitn(3, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for DefinitionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version from a definition's magic header line
pub fn parse_header(text: &str) -> Result<DefinitionVersion> {
    let first = text.lines().next().unwrap_or_default();
    let rest = first
        .strip_prefix(MAGIC_PREFIX)
        .ok_or_else(|| Error::Integrity("definition has no version header".to_string()))?;
    DefinitionVersion::parse(rest)
        .ok_or_else(|| Error::Integrity(format!("unparseable definition version: {rest}")))
}

/// Structural validation of an update candidate.
///
/// Nothing is executed: the header must parse to a version and the body
/// must render into a service definition that passes the same checks a
/// deploy would run. This is the sole integrity gate, so a candidate that
/// fails any part of it is never trusted.
pub fn validate_candidate(text: &str) -> Result<DefinitionVersion> {
    let version = parse_header(text)?;
    let probe = InstallPaths::at(PathBuf::from("/probe"));
    let rendered = render(text, &Substitutions::for_paths(&probe)?);
    StackDefinition::from_rendered(&rendered)?;
    Ok(version)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied { version: DefinitionVersion },
    UpToDate,
}

/// Replaces the installed deployment definition with a validated newer one.
///
/// The swap is a staged handoff rather than an in-place rewrite: fetch to
/// staging, validate, drop a pending marker, rename over the installed
/// file, clear the marker. The caller redeploys afterwards, and
/// [`SelfUpdater::resume_if_pending`] finishes the job if the process dies
/// mid-swap.
pub struct SelfUpdater {
    paths: InstallPaths,
    source: Arc<dyn RemoteSource>,
}

impl SelfUpdater {
    pub fn new(paths: InstallPaths, source: Arc<dyn RemoteSource>) -> Self {
        Self { paths, source }
    }

    /// Fetch, validate and install a new definition. On `Applied` the
    /// caller must reinitialize; a candidate that fails validation is
    /// discarded and the installed definition stays untouched.
    pub async fn check_and_apply(&self, url: &str) -> Result<UpdateOutcome> {
        if url.trim().is_empty() {
            return Err(Error::Validation("update URL is empty".to_string()));
        }

        std::fs::create_dir_all(self.paths.staging_dir())?;
        let candidate_path = self.paths.staging_dir().join(CANDIDATE_FILE);
        self.source.fetch(url, &candidate_path).await?;

        let text = store::load(&candidate_path)?;
        let candidate = match validate_candidate(&text) {
            Ok(version) => version,
            Err(e) => {
                warn!("rejecting update candidate: {e}");
                let _ = std::fs::remove_file(&candidate_path);
                return Err(e);
            }
        };

        let installed = parse_header(&store::load(&self.paths.definition_file())?)?;
        if candidate <= installed {
            info!("definition {installed} is current");
            let _ = std::fs::remove_file(&candidate_path);
            return Ok(UpdateOutcome::UpToDate);
        }

        // Marker first, then swap, then clear: whatever instant the process
        // dies at, resume_if_pending can finish from what is on disk.
        std::fs::write(
            self.paths.pending_update_marker(),
            format!("{candidate}\n"),
        )?;
        std::fs::rename(&candidate_path, self.paths.definition_file())?;
        std::fs::remove_file(self.paths.pending_update_marker())?;

        info!("definition updated {installed} -> {candidate}");
        Ok(UpdateOutcome::Applied { version: candidate })
    }

    /// Finish an apply that died between staging and redeploy. Returns true
    /// when a pending update was found; the caller should reinitialize.
    pub fn resume_if_pending(&self) -> Result<bool> {
        if !self.paths.pending_update_marker().exists() {
            return Ok(false);
        }

        let staged = self.paths.staging_dir().join(CANDIDATE_FILE);
        if staged.exists() {
            match store::load(&staged).and_then(|text| validate_candidate(&text)) {
                Ok(version) => {
                    std::fs::rename(&staged, self.paths.definition_file())?;
                    info!("completed interrupted update to {version}");
                }
                Err(e) => {
                    warn!("discarding staged update candidate: {e}");
                    let _ = std::fs::remove_file(&staged);
                }
            }
        }

        std::fs::remove_file(self.paths.pending_update_marker())?;
        Ok(true)
    }
}
