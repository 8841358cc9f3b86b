//! Persisted setup variables.
//!
//! `setupVars.conf` is the single durable artifact of an install run: a flat
//! `KEY=VALUE` file, one entry per line, re-written in full on every run and
//! read back by later pipeline stages and post-install tooling. Keys are
//! unique; values are stored literally (no quoting or escaping), so a value
//! must not contain a newline.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Well-known keys written by the installer.
pub const KEY_INTERFACE: &str = "XFILTER_INTERFACE";
pub const KEY_IPV4_ADDRESS: &str = "IPV4_ADDRESS";
pub const KEY_IPV6_ADDRESS: &str = "IPV6_ADDRESS";
pub const KEY_DNS_1: &str = "XFILTER_DNS_1";
pub const KEY_DNS_2: &str = "XFILTER_DNS_2";
pub const KEY_QUERY_LOGGING: &str = "QUERY_LOGGING";
pub const KEY_INSTALL_WEB: &str = "INSTALL_WEB";

/// In-memory view of `setupVars.conf`.
///
/// Loaded once at the start of a run and passed by reference into each
/// pipeline stage; a stage never re-reads the file behind the others' backs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupVars {
    values: BTreeMap<String, String>,
}

impl SetupVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load variables from a file. A missing file yields an empty set
    /// (first run); a present file must parse.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Parse `KEY=VALUE` lines. Blank lines are skipped; a later duplicate
    /// key overrides an earlier one.
    pub fn parse(content: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.to_string(), value.to_string());
            }
        }
        Self { values }
    }

    /// Serialize to `KEY=VALUE` lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.values {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Write the full variable set, replacing any previous file contents.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.render())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
