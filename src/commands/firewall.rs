//! Firewall configuration command.

use anyhow::Result;

use crate::firewall;
use crate::installer::check_root;
use crate::shell::RealCommandRunner;

pub async fn run(assume_yes: bool) -> Result<()> {
    check_root()?;

    let runner = RealCommandRunner::new();
    let prompter = super::make_prompter(assume_yes);
    firewall::configure(&runner, prompter.as_ref())?;
    Ok(())
}
