use crate::compose::Orchestrator;
use crate::fetch::RemoteSource;
use crate::stack::{StackDefinition, UI_SERVICE};
use crate::template::{render, Substitutions};
use crate::update;
use modelstack_common::Result;
use modelstack_config::{store, InstallPaths, LaunchConfig, WhitelistDoc};
use std::sync::Arc;
use tracing::{debug, info};

/// Model fetched on a fresh install
pub const DEFAULT_MODEL_FILE: &str = "llama-3.2-3b-instruct-q4_k_m.gguf";
pub const DEFAULT_MODEL_URL: &str =
    "https://huggingface.co/bartowski/Llama-3.2-3B-Instruct-GGUF/resolve/main/Llama-3.2-3B-Instruct-Q4_K_M.gguf";

/// Deployment definition compiled into the binary. `definition.yaml` starts
/// out as a copy of this and is replaced by updates.
pub(crate) const BUILTIN_DEFINITION: &str = include_str!("definition.yaml");

/// Materializes the deployment on disk and drives the orchestrator.
///
/// The controller is the only writer of `definition.yaml` and
/// `compose.yaml`, and writes the other documents exactly once, on first
/// install. Every later edit belongs to [`crate::ConfigMutator`].
pub struct DeploymentController {
    paths: InstallPaths,
    orchestrator: Arc<dyn Orchestrator>,
    source: Arc<dyn RemoteSource>,
}

impl DeploymentController {
    pub fn new(
        paths: InstallPaths,
        orchestrator: Arc<dyn Orchestrator>,
        source: Arc<dyn RemoteSource>,
    ) -> Self {
        Self {
            paths,
            orchestrator,
            source,
        }
    }

    /// First-time setup: directories, default model, default documents,
    /// rendered service definition, stack start.
    ///
    /// Safe to re-run: directories are created with create-if-absent
    /// semantics and existing documents and models are left alone.
    pub async fn initialize(&self) -> Result<()> {
        info!("initializing deployment at {}", self.paths.root().display());
        self.create_directories()?;
        self.ensure_default_model().await?;
        self.ensure_default_documents()?;
        self.render_service_definition()?;
        self.restart_stack().await
    }

    /// Update mode: re-render the compose document from the installed
    /// definition and restart.
    ///
    /// Never fetches models and never touches `launch.conf` or
    /// `whitelist.conf`, so applying an update cannot reset the operator's
    /// model choice, context size, or whitelist.
    pub async fn reinitialize(&self) -> Result<()> {
        info!("re-rendering service definition");
        self.render_service_definition()?;
        self.restart_stack().await
    }

    /// Stop-then-start of the full service set, sequenced so both services
    /// come back against the same configuration
    pub async fn restart_stack(&self) -> Result<()> {
        self.orchestrator.down().await?;
        self.orchestrator.up().await
    }

    /// Recreate only the UI service
    pub async fn restart_ui(&self) -> Result<()> {
        self.orchestrator.recreate_service(UI_SERVICE).await
    }

    fn create_directories(&self) -> Result<()> {
        for dir in [
            self.paths.root().to_path_buf(),
            self.paths.model_dir(),
            self.paths.ui_data_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    async fn ensure_default_model(&self) -> Result<()> {
        let dest = self.paths.model_path(DEFAULT_MODEL_FILE);
        if dest.exists() {
            debug!("default model already present");
            return Ok(());
        }
        info!("fetching default model {DEFAULT_MODEL_FILE}");
        self.source.fetch(DEFAULT_MODEL_URL, &dest).await?;
        Ok(())
    }

    fn ensure_default_documents(&self) -> Result<()> {
        let whitelist = self.paths.whitelist_file();
        if !whitelist.exists() {
            store::save_atomic(&whitelist, WhitelistDoc::default_document().as_str())?;
        }

        let launch = self.paths.launch_file();
        if !launch.exists() {
            store::save_atomic(
                &launch,
                &LaunchConfig::default_for(DEFAULT_MODEL_FILE).to_command_line(),
            )?;
        }

        let definition = self.paths.definition_file();
        if !definition.exists() {
            store::save_atomic(&definition, BUILTIN_DEFINITION)?;
        }

        Ok(())
    }

    fn render_service_definition(&self) -> Result<()> {
        let definition = store::load(&self.paths.definition_file())?;
        update::parse_header(&definition)?;

        let subs = Substitutions::for_paths(&self.paths)?;
        let rendered = render(&definition, &subs);
        StackDefinition::from_rendered(&rendered)?;

        store::save_atomic(&self.paths.compose_file(), &rendered)?;
        Ok(())
    }
}
