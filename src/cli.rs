//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xfilter-setup")]
#[command(author, version, about = "Unattended installer for the xfilter DNS filtering appliance")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Setup variables file path
    #[arg(
        short,
        long,
        default_value = "/etc/xfilter/setupVars.conf",
        global = true
    )]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Assume yes at every confirmation gate (unattended mode)
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full installation pipeline
    Install {
        /// Network interface the appliance listens on
        #[arg(long)]
        interface: Option<String>,

        /// Static IPv4 address of the appliance
        #[arg(long)]
        ipv4: Option<String>,

        /// Primary upstream DNS resolver
        #[arg(long)]
        dns1: Option<String>,

        /// Secondary upstream DNS resolver
        #[arg(long)]
        dns2: Option<String>,

        /// Abort when the package cache cannot be refreshed
        #[arg(long)]
        strict_package_cache: bool,
    },

    /// Classify the host's distribution family
    Distro,

    /// Check the SELinux enforcement posture
    Selinux,

    /// Detect the firewall backend and apply the appliance ruleset
    Firewall,

    /// Manage the FTL engine binary
    Engine {
        #[command(subcommand)]
        action: EngineAction,
    },

    /// Select an IPv6 address for blocking
    Ipv6,

    /// Print version
    Version,
}

#[derive(Subcommand)]
pub enum EngineAction {
    /// Detect the CPU architecture and install the matching engine binary
    Detect,

    /// Download and install a named engine binary
    Install {
        /// Artifact name, e.g. xfilter-FTL-linux-x86_64
        binary: String,
    },
}
