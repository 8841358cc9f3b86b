//! xfilter-setup - Host provisioning for the xfilter DNS filtering appliance.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use xfilter_setup::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command; a fatal stage error propagates and terminates the
    // process with exit code 1.
    match cli.command {
        Commands::Install {
            interface,
            ipv4,
            dns1,
            dns2,
            strict_package_cache,
        } => {
            xfilter_setup::commands::install::run(
                cli.config,
                interface,
                ipv4,
                dns1,
                dns2,
                strict_package_cache,
                cli.yes,
            )
            .await
        }
        Commands::Distro => xfilter_setup::commands::distro::run().await,
        Commands::Selinux => xfilter_setup::commands::selinux::run(cli.yes).await,
        Commands::Firewall => xfilter_setup::commands::firewall::run(cli.yes).await,
        Commands::Engine { action } => xfilter_setup::commands::engine::run(action).await,
        Commands::Ipv6 => xfilter_setup::commands::ipv6::run().await,
        Commands::Version => {
            println!("xfilter-setup {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
