use anyhow::Result;

mod menu;

use modelstack_config::InstallPaths;
use modelstack_deploy::{ComposeCli, DeploymentController, HttpSource};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let paths = InstallPaths::resolve()?;
    let orchestrator = Arc::new(ComposeCli::new(paths.compose_file()));
    let source = Arc::new(HttpSource::new()?);

    match std::env::args().nth(1).as_deref() {
        Some("install") => {
            let controller = DeploymentController::new(paths, orchestrator, source);
            controller.initialize().await?;
            info!("install complete");
        }
        Some("update") => {
            let controller = DeploymentController::new(paths, orchestrator, source);
            controller.reinitialize().await?;
            info!("update complete");
        }
        Some(other) => {
            eprintln!("unknown command: {other} (expected install, update, or no argument)");
            std::process::exit(2);
        }
        None => menu::Menu::new(paths, orchestrator, source).run().await?,
    }

    Ok(())
}
