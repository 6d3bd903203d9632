mod compose;
mod controller;
mod fetch;
mod mutator;
mod stack;
pub mod template;
mod update;

#[cfg(test)]
mod tests;


pub use compose::{ComposeCli, Orchestrator};
pub use controller::{DeploymentController, DEFAULT_MODEL_FILE, DEFAULT_MODEL_URL};
pub use fetch::{HttpSource, RemoteSource};
pub use mutator::ConfigMutator;
pub use stack::{ServiceSpec, StackDefinition, INFERENCE_SERVICE, UI_SERVICE};
pub use template::{render, Substitutions};
pub use update::{DefinitionVersion, SelfUpdater, UpdateOutcome};
