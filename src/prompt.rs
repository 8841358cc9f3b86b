//! Interactive confirmation gates.
//!
//! The installer pauses at a handful of decision points (SELinux enforcing,
//! firewall ruleset installation) and asks the operator to accept or decline.
//! The prompt itself is a port so tests can script both answers and headless
//! runs can accept everything.

use anyhow::Result;
use dialoguer::Confirm;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Trait for yes/no confirmation prompts.
#[cfg_attr(test, automock)]
pub trait Prompter: Send + Sync {
    /// Ask the operator a yes/no question. Returns true on accept.
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Terminal prompter backed by dialoguer.
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(message)
            .default(true)
            .interact()?)
    }
}

/// Prompter for unattended installs: accepts every gate.
#[derive(Debug, Clone, Default)]
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, message: &str) -> Result<bool> {
        debug!("Auto-accepting prompt: {}", message);
        Ok(true)
    }
}
