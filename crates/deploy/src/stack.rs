use modelstack_common::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Fixed service names in the rendered definition
pub const INFERENCE_SERVICE: &str = "inference";
pub const UI_SERVICE: &str = "webui";

const GPU_CAPABILITY: &str = "gpu";

/// Typed model of the rendered compose document.
///
/// Parsing is the inspection surface for rendering mistakes: the renderer
/// leaves unmatched placeholders in place, and this is where they (and any
/// other structural problem) turn into errors.
#[derive(Debug, Clone, Deserialize)]
pub struct StackDefinition {
    pub services: BTreeMap<String, ServiceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSpec {
    pub image: String,
    #[serde(default)]
    pub restart: Option<String>,
    #[serde(default)]
    pub network_mode: Option<String>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub deploy: Option<DeploySpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploySpec {
    #[serde(default)]
    pub resources: Option<ResourceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceSpec {
    #[serde(default)]
    pub reservations: Option<ReservationSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationSpec {
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSpec {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl StackDefinition {
    /// Parse and validate a rendered document
    pub fn from_rendered(text: &str) -> Result<Self> {
        if text.contains("{{") || text.contains("}}") {
            return Err(Error::Integrity(
                "template delimiters survived rendering".to_string(),
            ));
        }
        let stack: StackDefinition = serde_yaml::from_str(text)?;
        stack.validate()?;
        Ok(stack)
    }

    fn validate(&self) -> Result<()> {
        for name in [INFERENCE_SERVICE, UI_SERVICE] {
            if !self.services.contains_key(name) {
                return Err(Error::Integrity(format!(
                    "service definition is missing the {name} service"
                )));
            }
        }

        for (name, service) in &self.services {
            for volume in &service.volumes {
                let host = volume.split(':').next().unwrap_or_default();
                if !host.starts_with('/') {
                    return Err(Error::Integrity(format!(
                        "{name} volume host path is not absolute: {volume}"
                    )));
                }
            }
            if name != INFERENCE_SERVICE && service.reserves_gpu() {
                return Err(Error::Integrity(format!(
                    "gpu reservation belongs on {INFERENCE_SERVICE}, found on {name}"
                )));
            }
        }

        Ok(())
    }
}

impl ServiceSpec {
    /// Whether this service declares a gpu device capability
    pub fn reserves_gpu(&self) -> bool {
        self.deploy
            .as_ref()
            .and_then(|d| d.resources.as_ref())
            .and_then(|r| r.reservations.as_ref())
            .map(|r| {
                r.devices
                    .iter()
                    .any(|d| d.capabilities.iter().any(|c| c == GPU_CAPABILITY))
            })
            .unwrap_or(false)
    }
}
