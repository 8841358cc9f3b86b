//! Engine binary management commands.

use anyhow::Result;
use std::path::Path;

use crate::cli::EngineAction;
use crate::engine::{self, HttpFetcher};
use crate::installer::check_root;
use crate::shell::RealCommandRunner;

pub async fn run(action: EngineAction) -> Result<()> {
    check_root()?;

    let fetcher = HttpFetcher::new()?;
    let dest = Path::new(engine::INSTALL_PATH);

    match action {
        EngineAction::Detect => {
            let runner = RealCommandRunner::new();
            let tag = engine::detect(&runner)?;
            engine::fetch_and_install(&tag, &fetcher, dest).await?;
        }
        EngineAction::Install { binary } => {
            engine::install_binary(&binary, &fetcher, dest).await?;
        }
    }
    Ok(())
}
