//! Full installation command.

use anyhow::Result;

use crate::engine::HttpFetcher;
use crate::installer::{check_root, run_install, InstallOptions};
use crate::shell::RealCommandRunner;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: std::path::PathBuf,
    interface: Option<String>,
    ipv4: Option<String>,
    dns1: Option<String>,
    dns2: Option<String>,
    strict_package_cache: bool,
    assume_yes: bool,
) -> Result<()> {
    check_root()?;

    let runner = RealCommandRunner::new();
    let prompter = super::make_prompter(assume_yes);
    let fetcher = HttpFetcher::new()?;

    let opts = InstallOptions {
        config_path: config,
        interface,
        ipv4_address: ipv4,
        dns_1: dns1,
        dns_2: dns2,
        strict_package_cache,
        ..InstallOptions::default()
    };

    run_install(&runner, prompter.as_ref(), &fetcher, &opts).await
}
