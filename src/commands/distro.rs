//! Distribution classification command.

use anyhow::Result;

use crate::distro;
use crate::report;
use crate::shell::RealCommandRunner;

pub async fn run() -> Result<()> {
    let runner = RealCommandRunner::new();
    let family = distro::classify(&runner)?;
    report::tick(&format!("Supported OS detected ({})", family));
    Ok(())
}
