use modelstack_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Mount point of the model store inside the inference container
pub const CONTAINER_MODEL_ROOT: &str = "/models";

const MODEL_FLAG: &str = "--model";
const CTX_FLAG: &str = "--n_ctx";
const HOST_FLAG: &str = "--host";
const PORT_FLAG: &str = "--port";

/// Typed view of the inference launch command.
///
/// `launch.conf` holds a single shell-invokable command line. The document is
/// parsed into this record, mutated through its methods, and serialized back
/// out, so a flag can never end up duplicated or half-replaced no matter how
/// often the same mutation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    prelude: Vec<String>,
    model_path: Option<PathBuf>,
    ctx_size: Option<u64>,
    host: Option<String>,
    port: Option<u16>,
    extra: Vec<String>,
}

impl LaunchConfig {
    /// Launch command for a fresh install, wired to the given model file
    pub fn default_for(model_file: &str) -> Self {
        Self {
            prelude: vec![
                "python3".to_string(),
                "-m".to_string(),
                "llama_cpp.server".to_string(),
            ],
            model_path: Some(Path::new(CONTAINER_MODEL_ROOT).join(model_file)),
            ctx_size: None,
            host: Some("0.0.0.0".to_string()),
            port: Some(8000),
            extra: Vec::new(),
        }
    }

    /// Parse a launch command document
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = split_tokens(text)?;
        let mut cfg = Self {
            prelude: Vec::new(),
            model_path: None,
            ctx_size: None,
            host: None,
            port: None,
            extra: Vec::new(),
        };

        let mut seen_flag = false;
        let mut iter = tokens.into_iter();
        while let Some(token) = iter.next() {
            match token.as_str() {
                MODEL_FLAG => {
                    seen_flag = true;
                    let value = flag_value(MODEL_FLAG, iter.next())?;
                    if cfg.model_path.replace(PathBuf::from(value)).is_some() {
                        return Err(duplicate_flag(MODEL_FLAG));
                    }
                }
                CTX_FLAG => {
                    seen_flag = true;
                    let value = flag_value(CTX_FLAG, iter.next())?;
                    let size = value.parse::<u64>().map_err(|_| {
                        Error::Integrity(format!("{CTX_FLAG} value is not a number: {value}"))
                    })?;
                    if cfg.ctx_size.replace(size).is_some() {
                        return Err(duplicate_flag(CTX_FLAG));
                    }
                }
                HOST_FLAG => {
                    seen_flag = true;
                    let value = flag_value(HOST_FLAG, iter.next())?;
                    if cfg.host.replace(value).is_some() {
                        return Err(duplicate_flag(HOST_FLAG));
                    }
                }
                PORT_FLAG => {
                    seen_flag = true;
                    let value = flag_value(PORT_FLAG, iter.next())?;
                    let port = value.parse::<u16>().map_err(|_| {
                        Error::Integrity(format!("{PORT_FLAG} value is not a port: {value}"))
                    })?;
                    if cfg.port.replace(port).is_some() {
                        return Err(duplicate_flag(PORT_FLAG));
                    }
                }
                _ if seen_flag => cfg.extra.push(token),
                _ => cfg.prelude.push(token),
            }
        }

        Ok(cfg)
    }

    /// Serialize back to the on-disk command line.
    ///
    /// Known flags are emitted exactly once; the context-size flag goes last
    /// among them so a newly set value lands where an operator would have
    /// appended it. Tokens containing whitespace, quotes or backslashes are
    /// double-quoted with `\`-escapes.
    pub fn to_command_line(&self) -> String {
        let mut tokens: Vec<String> = self.prelude.clone();
        if let Some(path) = &self.model_path {
            tokens.push(MODEL_FLAG.to_string());
            tokens.push(path.display().to_string());
        }
        if let Some(host) = &self.host {
            tokens.push(HOST_FLAG.to_string());
            tokens.push(host.clone());
        }
        if let Some(port) = self.port {
            tokens.push(PORT_FLAG.to_string());
            tokens.push(port.to_string());
        }
        if let Some(size) = self.ctx_size {
            tokens.push(CTX_FLAG.to_string());
            tokens.push(size.to_string());
        }
        tokens.extend(self.extra.iter().cloned());

        let mut line = tokens
            .iter()
            .map(|t| quote_token(t))
            .collect::<Vec<_>>()
            .join(" ");
        line.push('\n');
        line
    }

    /// Point the `--model` flag at a new file.
    ///
    /// The flag must already exist; a document without one was not produced
    /// by this tool and should be looked at, not patched over.
    pub fn set_model(&mut self, path: PathBuf) -> Result<()> {
        if self.model_path.is_none() {
            return Err(Error::MissingFlag(MODEL_FLAG));
        }
        self.model_path = Some(path);
        Ok(())
    }

    /// Set or clear the context-window flag. `None` removes the flag
    /// entirely rather than writing a sentinel value.
    pub fn set_ctx_size(&mut self, size: Option<u64>) -> Result<()> {
        if size == Some(0) {
            return Err(Error::Validation(
                "context size must be a positive integer".to_string(),
            ));
        }
        self.ctx_size = size;
        Ok(())
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    /// File name portion of the active model path
    pub fn model_file_name(&self) -> Option<String> {
        self.model_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn ctx_size(&self) -> Option<u64> {
        self.ctx_size
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

fn duplicate_flag(flag: &str) -> Error {
    Error::Integrity(format!("duplicate {flag} flag in launch command"))
}

fn flag_value(flag: &'static str, token: Option<String>) -> Result<String> {
    token.ok_or_else(|| Error::Integrity(format!("{flag} flag has no value")))
}

/// Shell-style tokenizer: whitespace separates, double quotes group,
/// backslash escapes the next character.
fn split_tokens(text: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or_else(|| {
                    Error::Integrity("dangling escape in launch command".to_string())
                })?;
                current.push(escaped);
                in_token = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err(Error::Integrity(
            "unterminated quote in launch command".to_string(),
        ));
    }
    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

fn quote_token(token: &str) -> String {
    let needs_quoting =
        token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if !needs_quoting {
        return token.to_string();
    }
    let escaped = token.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
