//! The interactive operator menu.
//!
//! One blocking loop, one operation at a time. The loop is the top-level
//! recovery boundary: every operation error is reported and control comes
//! back to the menu, so a typo or a failed download can never take the
//! whole tool down.

use modelstack_common::{Error, Result};
use modelstack_config::{AddOutcome, InstallPaths, ToggleOutcome, WhitelistState};
use modelstack_deploy::{
    ConfigMutator, DeploymentController, Orchestrator, RemoteSource, SelfUpdater, UpdateOutcome,
    INFERENCE_SERVICE, UI_SERVICE,
};
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info};

/// Where `Check for updates` looks for a newer deployment definition
const DEFINITION_URL: &str =
    "https://raw.githubusercontent.com/modelstack/modelstack/main/deploy/definition.yaml";

const MENU: &str = "\
 1) Service status
 2) List models
 3) Select active model
 4) Download a model
 5) Set context size
 6) Add whitelist address
 7) Enable/disable whitelist
 8) Follow inference logs
 9) Follow UI logs
10) Check for updates
11) Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Status,
    ListModels,
    SelectModel,
    DownloadModel,
    SetCtxSize,
    AddWhitelistEntry,
    ToggleWhitelist,
    InferenceLogs,
    UiLogs,
    CheckUpdates,
    Exit,
}

pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "1" => Some(MenuChoice::Status),
        "2" => Some(MenuChoice::ListModels),
        "3" => Some(MenuChoice::SelectModel),
        "4" => Some(MenuChoice::DownloadModel),
        "5" => Some(MenuChoice::SetCtxSize),
        "6" => Some(MenuChoice::AddWhitelistEntry),
        "7" => Some(MenuChoice::ToggleWhitelist),
        "8" => Some(MenuChoice::InferenceLogs),
        "9" => Some(MenuChoice::UiLogs),
        "10" => Some(MenuChoice::CheckUpdates),
        "11" => Some(MenuChoice::Exit),
        _ => None,
    }
}

pub struct Menu {
    paths: InstallPaths,
    orchestrator: Arc<dyn Orchestrator>,
    source: Arc<dyn RemoteSource>,
    controller: DeploymentController,
    mutator: ConfigMutator,
    updater: SelfUpdater,
    lines: Lines<BufReader<Stdin>>,
}

impl Menu {
    pub fn new(
        paths: InstallPaths,
        orchestrator: Arc<dyn Orchestrator>,
        source: Arc<dyn RemoteSource>,
    ) -> Self {
        let controller =
            DeploymentController::new(paths.clone(), orchestrator.clone(), source.clone());
        let mutator = ConfigMutator::new(paths.clone(), orchestrator.clone());
        let updater = SelfUpdater::new(paths.clone(), source.clone());

        Self {
            paths,
            orchestrator,
            source,
            controller,
            mutator,
            updater,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // An update swap that died half-way is finished before the operator
        // gets a prompt
        if self.updater.resume_if_pending()? {
            info!("finishing interrupted definition update");
            self.controller.reinitialize().await?;
        }

        loop {
            println!("\n{MENU}");
            let Some(line) = self.prompt("Select an option: ").await? else {
                break;
            };
            let Some(choice) = parse_choice(&line) else {
                println!("Enter a number between 1 and 11.");
                continue;
            };
            if choice == MenuChoice::Exit {
                break;
            }

            if let Err(e) = self.dispatch(choice).await {
                error!(error_type = e.error_type(), "operation failed: {e}");
                println!("Error: {e}");
            }
        }

        println!("Bye.");
        Ok(())
    }

    async fn dispatch(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::Status => self.show_status().await,
            MenuChoice::ListModels => self.show_models(),
            MenuChoice::SelectModel => self.select_model().await,
            MenuChoice::DownloadModel => self.download_model().await,
            MenuChoice::SetCtxSize => self.set_ctx_size().await,
            MenuChoice::AddWhitelistEntry => self.add_whitelist_entry().await,
            MenuChoice::ToggleWhitelist => self.toggle_whitelist().await,
            MenuChoice::InferenceLogs => self.orchestrator.logs(INFERENCE_SERVICE).await,
            MenuChoice::UiLogs => self.orchestrator.logs(UI_SERVICE).await,
            MenuChoice::CheckUpdates => self.check_updates().await,
            MenuChoice::Exit => Ok(()),
        }
    }

    async fn show_status(&self) -> Result<()> {
        let model = self
            .mutator
            .current_model()?
            .unwrap_or_else(|| "(none)".to_string());
        let ctx = self
            .mutator
            .current_ctx_size()?
            .map(|n| n.to_string())
            .unwrap_or_else(|| "model default".to_string());
        let state = match self.mutator.whitelist_state()? {
            WhitelistState::Enabled => "enabled",
            WhitelistState::Disabled => "disabled",
            WhitelistState::Unknown => "unknown (repair whitelist.conf by hand)",
        };

        println!("Active model:  {model}");
        println!("Context size:  {ctx}");
        println!(
            "Whitelist:     {state}, {} entries",
            self.mutator.whitelist_entries()?.len()
        );
        println!("{}", self.orchestrator.ps().await?);
        Ok(())
    }

    fn show_models(&self) -> Result<()> {
        let models = self.mutator.list_models()?;
        if models.is_empty() {
            println!("The model store is empty. Use option 4 to download one.");
            return Ok(());
        }
        let current = self.mutator.current_model()?;
        for (i, name) in models.iter().enumerate() {
            let marker = if current.as_deref() == Some(name) {
                " (active)"
            } else {
                ""
            };
            println!("{:>2}) {name}{marker}", i + 1);
        }
        Ok(())
    }

    async fn select_model(&mut self) -> Result<()> {
        let models = self.mutator.list_models()?;
        if models.is_empty() {
            return Err(Error::NotFound("no models in the store".to_string()));
        }
        for (i, name) in models.iter().enumerate() {
            println!("{:>2}) {name}", i + 1);
        }

        let Some(input) = self.prompt("Model number: ").await? else {
            return Ok(());
        };
        let index: usize = input
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("not a number: {}", input.trim())))?;
        let name = index
            .checked_sub(1)
            .and_then(|i| models.get(i))
            .ok_or_else(|| Error::Validation(format!("no model numbered {index}")))?
            .clone();

        self.mutator.set_active_model(&name).await?;
        println!("Active model is now {name}.");
        Ok(())
    }

    async fn download_model(&mut self) -> Result<()> {
        let Some(url) = self.prompt("Model URL: ").await? else {
            return Ok(());
        };
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(Error::Validation("URL is empty".to_string()));
        }

        let name = url
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::Validation(format!("cannot derive a file name from {url}")))?
            .to_string();
        let dest = self.paths.model_path(&name);
        if dest.exists() {
            return Err(Error::Validation(format!(
                "{name} is already in the store"
            )));
        }

        println!("Downloading {name}, Ctrl-C to cancel.");
        let bytes = self.source.fetch(&url, &dest).await?;
        println!("Downloaded {name} ({bytes} bytes). Use option 3 to activate it.");
        Ok(())
    }

    async fn set_ctx_size(&mut self) -> Result<()> {
        let Some(input) = self
            .prompt("Context size (a number, or \"default\"): ")
            .await?
        else {
            return Ok(());
        };
        let input = input.trim();

        let size = if input.eq_ignore_ascii_case("default") {
            None
        } else {
            Some(
                input
                    .parse::<u64>()
                    .map_err(|_| Error::Validation(format!("not a number: {input}")))?,
            )
        };

        self.mutator.set_ctx_size(size).await?;
        match size {
            Some(n) => println!("Context size is now {n}."),
            None => println!("Context size follows the model default again."),
        }
        Ok(())
    }

    async fn add_whitelist_entry(&mut self) -> Result<()> {
        let Some(input) = self.prompt("Address to whitelist: ").await? else {
            return Ok(());
        };
        match self.mutator.add_whitelist_entry(&input).await? {
            AddOutcome::Added => println!("Added {}.", input.trim()),
            AddOutcome::AlreadyPresent => {
                println!("{} is already whitelisted; nothing to do.", input.trim())
            }
        }
        Ok(())
    }

    async fn toggle_whitelist(&mut self) -> Result<()> {
        match self.mutator.toggle_whitelist().await? {
            ToggleOutcome::NowEnabled => println!("Whitelist is now enforced."),
            ToggleOutcome::NowDisabled => println!("Whitelist is no longer enforced."),
        }
        Ok(())
    }

    async fn check_updates(&mut self) -> Result<()> {
        match self.updater.check_and_apply(DEFINITION_URL).await? {
            UpdateOutcome::Applied { version } => {
                println!("Deployment definition updated to {version}; redeploying.");
                self.controller.reinitialize().await
            }
            UpdateOutcome::UpToDate => {
                println!("Already up to date.");
                Ok(())
            }
        }
    }

    /// Print a prompt and read one line; None means stdin closed
    async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        print!("{text}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }
}
