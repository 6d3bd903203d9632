//! Placeholder substitution for the deployment definition.
//!
//! Rendering is a pure function of its inputs. Placeholders look like
//! `{{key}}`; unmatched ones are left in place for downstream validation to
//! flag rather than being treated as an error here.

use modelstack_common::{Error, Result};
use modelstack_config::InstallPaths;
use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder bindings for a render pass.
///
/// Values are escaped for the double-quoted YAML scalars the stock
/// definition places every placeholder in, so a path containing `"` or `\`
/// (or a space, which needs no escape inside quotes) cannot corrupt the
/// document structure.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    values: BTreeMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `{{key}}` to a value
    pub fn bind(&mut self, key: &str, value: &str) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        self.values.insert(key.to_string(), escaped);
    }

    /// The standard bindings for a deployment rooted at `paths`
    pub fn for_paths(paths: &InstallPaths) -> Result<Self> {
        let mut subs = Self::new();
        subs.bind("install_dir", path_str(paths.root())?);
        subs.bind("model_dir", path_str(&paths.model_dir())?);
        subs.bind("ui_data_dir", path_str(&paths.ui_data_dir())?);
        Ok(subs)
    }
}

/// Replace every occurrence of each bound placeholder
pub fn render(template: &str, subs: &Substitutions) -> String {
    let mut out = template.to_string();
    for (key, value) in &subs.values {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::Validation(format!("path is not valid UTF-8: {}", path.display())))
}
