use async_trait::async_trait;
use modelstack_common::{Error, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

const PROJECT_NAME: &str = "modelstack";

// stderr fragments from `down` that just mean "nothing was running"
const TOLERATED_DOWN_ERRORS: &[&str] = &["no such", "not running", "no container"];

/// The five orchestrator operations the deployment depends on
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Stop and remove the whole service set; tolerates an already-stopped stack
    async fn down(&self) -> Result<()>;

    /// Start the full service set detached
    async fn up(&self) -> Result<()>;

    /// Recreate a single service without touching its dependencies
    async fn recreate_service(&self, service: &str) -> Result<()>;

    /// Human-readable service status
    async fn ps(&self) -> Result<String>;

    /// Follow a service's logs until the operator interrupts
    async fn logs(&self, service: &str) -> Result<()>;
}

/// `docker compose` implementation of [`Orchestrator`]
pub struct ComposeCli {
    compose_file: PathBuf,
}

impl ComposeCli {
    pub fn new(compose_file: PathBuf) -> Self {
        Self { compose_file }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("compose")
            .arg("-p")
            .arg(PROJECT_NAME)
            .arg("-f")
            .arg(&self.compose_file);
        cmd
    }

    async fn run(&self, arguments: &[&str], tolerated: &[&str]) -> Result<String> {
        let output = self
            .command()
            .args(arguments)
            .output()
            .await
            .map_err(|e| Error::Orchestrator(format!("failed to start docker compose: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lowered = stderr.to_lowercase();
            if !tolerated.iter().any(|t| lowered.contains(t)) {
                return Err(Error::Orchestrator(format!(
                    "docker compose {} failed (exit {}): {}",
                    arguments.first().unwrap_or(&""),
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                )));
            }
            debug!("tolerated compose failure: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Orchestrator for ComposeCli {
    async fn down(&self) -> Result<()> {
        self.run(&["down"], TOLERATED_DOWN_ERRORS).await?;
        Ok(())
    }

    async fn up(&self) -> Result<()> {
        self.run(&["up", "-d"], &[]).await?;
        Ok(())
    }

    async fn recreate_service(&self, service: &str) -> Result<()> {
        self.run(&["up", "-d", "--force-recreate", "--no-deps", service], &[])
            .await?;
        Ok(())
    }

    async fn ps(&self) -> Result<String> {
        self.run(&["ps"], &[]).await
    }

    async fn logs(&self, service: &str) -> Result<()> {
        info!("following {service} logs, Ctrl-C to stop");

        let mut child = self
            .command()
            .args(["logs", "--follow", "--tail", "100", service])
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| Error::Orchestrator(format!("failed to start docker compose: {e}")))?;

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if !status.success() {
                    return Err(Error::Orchestrator(format!(
                        "log follower exited with {status}"
                    )));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
            }
        }

        Ok(())
    }
}
