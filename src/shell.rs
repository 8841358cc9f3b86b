//! Command execution abstraction for testability.
//!
//! This module provides a trait-based abstraction over command execution,
//! allowing unit tests to mock system utility calls without actually running
//! them. Every host-state probe the installer performs (package-manager
//! presence, firewall status, SELinux mode, architecture signals, IPv6
//! addresses) goes through this port.

use anyhow::Result;
use std::process::{Command, Stdio};

#[cfg(test)]
use mockall::automock;

/// Output from command execution
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// The exit code, if available
    pub code: Option<i32>,
}

/// Trait for command execution, allowing dependency injection for testing.
///
/// The real implementation uses actual system commands, while tests use a
/// mock to control probe results and count backend mutations.
#[cfg_attr(test, automock)]
pub trait CommandRunner: Send + Sync {
    /// Execute a command with the given arguments.
    ///
    /// A non-zero exit is not an error at this layer; callers inspect
    /// `success` to branch on host state.
    fn run(&self, cmd: &str, args: &[String]) -> Result<CommandOutput>;

    /// Check whether an executable is present on the host's PATH.
    fn has_command(&self, name: &str) -> bool;
}

/// Real implementation of CommandRunner that runs actual system commands.
#[derive(Debug, Clone, Default)]
pub struct RealCommandRunner;

impl RealCommandRunner {
    /// Create a new RealCommandRunner
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for RealCommandRunner {
    fn run(&self, cmd: &str, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(cmd)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }

    fn has_command(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }
}

/// Helper function to convert a slice of &str to Vec<String>.
///
/// This is needed because mockall has issues with lifetimes in `&[&str]`,
/// so we use `&[String]` in the trait signature instead.
pub fn args_to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
