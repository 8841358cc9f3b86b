//! SELinux gate command.

use anyhow::Result;

use crate::selinux;
use crate::shell::RealCommandRunner;

pub async fn run(assume_yes: bool) -> Result<()> {
    let runner = RealCommandRunner::new();
    let prompter = super::make_prompter(assume_yes);
    selinux::gate(&runner, prompter.as_ref())?;
    Ok(())
}
