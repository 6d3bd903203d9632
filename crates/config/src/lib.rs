mod access;
mod inventory;
mod launch;
mod paths;
pub mod store;

#[cfg(test)]
mod tests;

pub use access::{AddOutcome, ToggleOutcome, WhitelistDoc, WhitelistState};
pub use inventory::{ModelInventory, MODEL_EXTENSION};
pub use launch::{LaunchConfig, CONTAINER_MODEL_ROOT};
pub use paths::InstallPaths;
