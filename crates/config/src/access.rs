use modelstack_common::{Error, Result};
use std::net::Ipv4Addr;
use tracing::warn;

const ENFORCE_MARKER: &str = "enforce = on";
const ENTRY_KEY: &str = "allow";

/// Whether the whitelist is being enforced.
///
/// `Unknown` means the document carries neither the active marker nor its
/// commented-out form — someone edited it by hand. The toggle refuses to
/// guess its way out of that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitelistState {
    Enabled,
    Disabled,
    Unknown,
}

/// Result of flipping the enforcement marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    NowEnabled,
    NowDisabled,
}

/// Result of adding an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// The UI access whitelist document.
///
/// Line-oriented text: one `enforce = on` marker (commented out with `#`
/// while disabled, so the entry list survives a disable/enable round trip)
/// and one `allow = <address>` line per whitelisted address. Unrecognized
/// lines are preserved verbatim by every mutation.
#[derive(Debug, Clone)]
pub struct WhitelistDoc {
    text: String,
}

impl WhitelistDoc {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    /// Document written on a fresh install: enforcing, loopback only
    pub fn default_document() -> Self {
        Self {
            text: format!(
                "# Addresses allowed to reach the web interface, one per line.\n\
                 {ENFORCE_MARKER}\n\
                 {ENTRY_KEY} = 127.0.0.1\n"
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn state(&self) -> WhitelistState {
        for line in self.text.lines() {
            if is_enabled_marker(line) {
                return WhitelistState::Enabled;
            }
            if is_disabled_marker(line) {
                return WhitelistState::Disabled;
            }
        }
        WhitelistState::Unknown
    }

    /// Whitelisted addresses in document order
    pub fn entries(&self) -> Vec<Ipv4Addr> {
        let mut entries = Vec::new();
        for line in self.text.lines() {
            let Some(value) = entry_value(line) else {
                continue;
            };
            match value.parse::<Ipv4Addr>() {
                Ok(ip) => {
                    if !entries.contains(&ip) {
                        entries.push(ip);
                    }
                }
                Err(_) => warn!("skipping unparseable whitelist entry: {value}"),
            }
        }
        entries
    }

    /// Add an address. Adding one that is already listed changes nothing
    /// and reports `AlreadyPresent`.
    pub fn add_entry(&mut self, ip: Ipv4Addr) -> AddOutcome {
        if self.entries().contains(&ip) {
            return AddOutcome::AlreadyPresent;
        }

        let mut lines: Vec<String> = self.text.split('\n').map(str::to_string).collect();
        let new_line = format!("{ENTRY_KEY} = {ip}");

        // Insert after the last existing entry to keep the list contiguous;
        // fall back to the end of the document.
        match lines.iter().rposition(|l| entry_value(l).is_some()) {
            Some(pos) => lines.insert(pos + 1, new_line),
            None => {
                let pos = last_content_line(&lines);
                lines.insert(pos + 1, new_line);
            }
        }

        self.text = lines.join("\n");
        AddOutcome::Added
    }

    /// Flip between enforcing and not enforcing without touching the entry
    /// list. A document in `Unknown` state is left byte-for-byte unchanged.
    pub fn toggle(&mut self) -> Result<ToggleOutcome> {
        let mut lines: Vec<String> = self.text.split('\n').map(str::to_string).collect();

        if let Some(pos) = lines.iter().position(|l| is_enabled_marker(l)) {
            lines[pos] = format!("# {ENFORCE_MARKER}");
            self.text = lines.join("\n");
            return Ok(ToggleOutcome::NowDisabled);
        }

        if let Some(pos) = lines.iter().position(|l| is_disabled_marker(l)) {
            lines[pos] = ENFORCE_MARKER.to_string();
            self.text = lines.join("\n");
            return Ok(ToggleOutcome::NowEnabled);
        }

        Err(Error::WhitelistStateUnknown)
    }
}

fn is_enabled_marker(line: &str) -> bool {
    line.trim() == ENFORCE_MARKER
}

fn is_disabled_marker(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed
        .strip_prefix('#')
        .map(|rest| rest.trim() == ENFORCE_MARKER)
        .unwrap_or(false)
}

/// The value of an `allow = ...` line, or None for any other line
fn entry_value(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    (key.trim() == ENTRY_KEY).then(|| value.trim())
}

/// Index of the last non-empty line, so appends land before trailing blanks
fn last_content_line(lines: &[String]) -> usize {
    lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(0)
}
