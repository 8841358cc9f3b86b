//! SELinux posture gate.
//!
//! The filtering engine ships no SELinux policy, so an enforcing host needs
//! an explicit operator decision before installation continues.

use anyhow::Result;
use tracing::{debug, warn};

use crate::error::SetupError;
use crate::prompt::Prompter;
use crate::report;
use crate::shell::{args_to_strings, CommandRunner};

/// Snapshot of the host's SELinux enforcement state at install time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SELinuxMode {
    Enforcing,
    Permissive,
    Disabled,
    /// getenforce is present but returned something unrecognizable.
    Unknown,
}

impl SELinuxMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SELinuxMode::Enforcing => "Enforcing",
            SELinuxMode::Permissive => "Permissive",
            SELinuxMode::Disabled => "Disabled",
            SELinuxMode::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for SELinuxMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SELinuxMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.trim() {
            "Enforcing" => Ok(SELinuxMode::Enforcing),
            "Permissive" => Ok(SELinuxMode::Permissive),
            "Disabled" => Ok(SELinuxMode::Disabled),
            _ => Err(()),
        }
    }
}

/// Query the enforcement state. `None` means the host has no SELinux
/// tooling at all (the common case outside the Red Hat family).
pub fn detect_mode(runner: &dyn CommandRunner) -> Result<Option<SELinuxMode>> {
    if !runner.has_command("getenforce") {
        debug!("getenforce not present, SELinux not installed");
        return Ok(None);
    }

    let output = runner.run("getenforce", &args_to_strings(&[]))?;
    if !output.success {
        warn!("getenforce failed: {}", output.stderr.trim());
        return Ok(Some(SELinuxMode::Unknown));
    }

    Ok(Some(
        output
            .stdout
            .parse()
            .unwrap_or(SELinuxMode::Unknown),
    ))
}

/// Gate installation on the host's SELinux posture.
///
/// Permissive and Disabled continue unconditionally. Enforcing requires an
/// operator decision; declining aborts the run. An undeterminable mode is
/// surfaced to the operator rather than silently assumed either way.
pub fn gate(runner: &dyn CommandRunner, prompter: &dyn Prompter) -> Result<(), SetupError> {
    let mode = match detect_mode(runner).map_err(|e| SetupError::CommandFailed {
        command: "getenforce".to_string(),
        detail: e.to_string(),
    })? {
        Some(mode) => mode,
        None => return Ok(()),
    };

    match mode {
        SELinuxMode::Permissive | SELinuxMode::Disabled => {
            report::info(&format!("SELinux mode detected: {}", mode));
            Ok(())
        }
        SELinuxMode::Enforcing => {
            report::info("SELinux mode detected: Enforcing");
            let accepted = prompter
                .confirm(
                    "SELinux is set to Enforcing and may prevent xfilter from working. \
                     Continue installing anyway?",
                )
                .map_err(|e| SetupError::CommandFailed {
                    command: "confirmation prompt".to_string(),
                    detail: e.to_string(),
                })?;
            if accepted {
                report::info("Continuing installation with SELinux Enforcing");
                report::info(
                    "Please refer to official SELinux documentation to create a custom policy",
                );
                Ok(())
            } else {
                println!("SELinux Enforcing detected, exiting installer");
                Err(SetupError::SelinuxDeclined)
            }
        }
        SELinuxMode::Unknown => {
            report::info("SELinux mode could not be determined");
            let accepted = prompter
                .confirm("Unable to determine the SELinux enforcement mode. Continue anyway?")
                .map_err(|e| SetupError::CommandFailed {
                    command: "confirmation prompt".to_string(),
                    detail: e.to_string(),
                })?;
            if accepted {
                warn!("Continuing with undetermined SELinux mode");
                Ok(())
            } else {
                Err(SetupError::SelinuxUnresolved)
            }
        }
    }
}
