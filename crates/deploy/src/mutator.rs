use crate::compose::Orchestrator;
use crate::stack::UI_SERVICE;
use modelstack_common::{Error, Result};
use modelstack_config::{
    store, AddOutcome, InstallPaths, LaunchConfig, ModelInventory, ToggleOutcome, WhitelistDoc,
    WhitelistState, CONTAINER_MODEL_ROOT,
};
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Applies single targeted edits to the configuration documents and
/// restarts exactly the services affected.
///
/// Launch-command changes restart the full stack; whitelist changes
/// recreate only the UI service, leaving a long-running inference process
/// alone. The document is always written before any restart is attempted,
/// and validation failures leave it untouched.
pub struct ConfigMutator {
    paths: InstallPaths,
    orchestrator: Arc<dyn Orchestrator>,
}

impl ConfigMutator {
    pub fn new(paths: InstallPaths, orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self {
            paths,
            orchestrator,
        }
    }

    // -- pure reads -----------------------------------------------------

    pub fn list_models(&self) -> Result<Vec<String>> {
        self.inventory().list()
    }

    pub fn current_model(&self) -> Result<Option<String>> {
        Ok(self.load_launch()?.model_file_name())
    }

    pub fn current_ctx_size(&self) -> Result<Option<u64>> {
        Ok(self.load_launch()?.ctx_size())
    }

    pub fn whitelist_state(&self) -> Result<WhitelistState> {
        Ok(self.load_whitelist()?.state())
    }

    pub fn whitelist_entries(&self) -> Result<Vec<Ipv4Addr>> {
        Ok(self.load_whitelist()?.entries())
    }

    // -- mutations ------------------------------------------------------

    /// Switch the inference service to a model from the inventory
    pub async fn set_active_model(&self, name: &str) -> Result<()> {
        if !self.inventory().contains(name)? {
            return Err(Error::ModelNotFound(name.to_string()));
        }

        let mut launch = self.load_launch()?;
        launch.set_model(Path::new(CONTAINER_MODEL_ROOT).join(name))?;
        self.save_launch(&launch)?;

        info!("active model set to {name}");
        self.restart_stack().await
    }

    /// Set the context-window size, or reset to the model default with `None`
    pub async fn set_ctx_size(&self, size: Option<u64>) -> Result<()> {
        let mut launch = self.load_launch()?;
        launch.set_ctx_size(size)?;
        self.save_launch(&launch)?;

        match size {
            Some(n) => info!("context size set to {n}"),
            None => info!("context size reset to model default"),
        }
        self.restart_stack().await
    }

    /// Whitelist an address.
    ///
    /// The input must parse as a real IPv4 address, so out-of-range octets
    /// like `300.1.1.1` are rejected. An address that is already listed is
    /// reported as such and triggers no write and no restart.
    pub async fn add_whitelist_entry(&self, raw: &str) -> Result<AddOutcome> {
        let ip: Ipv4Addr = raw
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("not an IPv4 address: {raw}")))?;

        let mut doc = self.load_whitelist()?;
        match doc.add_entry(ip) {
            AddOutcome::AlreadyPresent => Ok(AddOutcome::AlreadyPresent),
            AddOutcome::Added => {
                store::save_atomic(&self.paths.whitelist_file(), doc.as_str())?;
                info!("whitelisted {ip}");
                self.restart_ui().await?;
                Ok(AddOutcome::Added)
            }
        }
    }

    /// Flip whitelist enforcement. A document in an unrecognizable state is
    /// reported and left exactly as it was.
    pub async fn toggle_whitelist(&self) -> Result<ToggleOutcome> {
        let mut doc = self.load_whitelist()?;
        let outcome = doc.toggle()?;
        store::save_atomic(&self.paths.whitelist_file(), doc.as_str())?;

        info!("whitelist now {outcome:?}");
        self.restart_ui().await?;
        Ok(outcome)
    }

    // -- plumbing -------------------------------------------------------

    fn inventory(&self) -> ModelInventory {
        ModelInventory::new(self.paths.model_dir())
    }

    fn load_launch(&self) -> Result<LaunchConfig> {
        LaunchConfig::parse(&store::load(&self.paths.launch_file())?)
    }

    fn save_launch(&self, launch: &LaunchConfig) -> Result<()> {
        store::save_atomic(&self.paths.launch_file(), &launch.to_command_line())
    }

    fn load_whitelist(&self) -> Result<WhitelistDoc> {
        Ok(WhitelistDoc::new(store::load(
            &self.paths.whitelist_file(),
        )?))
    }

    async fn restart_stack(&self) -> Result<()> {
        self.orchestrator.down().await?;
        self.orchestrator.up().await
    }

    async fn restart_ui(&self) -> Result<()> {
        self.orchestrator.recreate_service(UI_SERVICE).await
    }
}
