//! CLI command implementations.
//!
//! Each command is a thin wrapper that wires the real ports (command runner,
//! prompter, fetcher) into the corresponding pipeline stage.

pub mod distro;
pub mod engine;
pub mod firewall;
pub mod install;
pub mod ipv6;
pub mod selinux;

use crate::prompt::{AssumeYes, Prompter, TerminalPrompter};

/// Pick the prompter implied by the `--yes` flag.
pub(crate) fn make_prompter(assume_yes: bool) -> Box<dyn Prompter> {
    if assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompter::new())
    }
}
