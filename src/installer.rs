//! The installation pipeline.
//!
//! Stages run strictly in sequence; each reads host state through the
//! command port and either returns a decision or aborts the run. Fatal
//! conditions stop the pipeline immediately — an unknown architecture never
//! reaches the download stage.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::distro;
use crate::engine::{self, BinaryFetcher};
use crate::firewall;
use crate::ipv6;
use crate::prompt::Prompter;
use crate::report;
use crate::selinux;
use crate::setupvars::{
    SetupVars, KEY_DNS_1, KEY_DNS_2, KEY_INSTALL_WEB, KEY_INTERFACE, KEY_IPV4_ADDRESS,
    KEY_IPV6_ADDRESS, KEY_QUERY_LOGGING,
};
use crate::shell::CommandRunner;

/// Options for a full installation run.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Path of the persisted setup variables file.
    pub config_path: PathBuf,
    /// Where the engine binary is installed.
    pub engine_install_path: PathBuf,
    /// Network settings; `None` keeps whatever a previous run recorded.
    pub interface: Option<String>,
    pub ipv4_address: Option<String>,
    pub dns_1: Option<String>,
    pub dns_2: Option<String>,
    /// Treat a package-cache refresh failure as fatal.
    pub strict_package_cache: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("/etc/xfilter/setupVars.conf"),
            engine_install_path: PathBuf::from(engine::INSTALL_PATH),
            interface: None,
            ipv4_address: None,
            dns_1: None,
            dns_2: None,
            strict_package_cache: false,
        }
    }
}

/// Check if running as root (effective UID == 0).
///
/// Firewall mutation and binary installation need root; probing alone does
/// not, so the check lives at the command layer rather than in the stages.
pub fn check_root() -> Result<()> {
    // SAFETY: geteuid() reads the effective user ID, has no preconditions,
    // never fails, and modifies no state.
    let euid = unsafe { libc::geteuid() };

    if euid != 0 {
        anyhow::bail!("The installer requires root privileges. Please run with sudo.")
    }
    Ok(())
}

/// Run every installation stage in order.
pub async fn run_install(
    runner: &dyn CommandRunner,
    prompter: &dyn Prompter,
    fetcher: &dyn BinaryFetcher,
    opts: &InstallOptions,
) -> Result<()> {
    let family = distro::classify(runner)?;
    info!("Host classified as {}", family);

    match distro::update_package_cache(runner, family) {
        Ok(()) => {}
        Err(e) if opts.strict_package_cache => return Err(e.into()),
        Err(e) => warn!("Continuing with stale package cache: {}", e),
    }

    selinux::gate(runner, prompter)?;

    let mut vars = SetupVars::load(&opts.config_path)
        .with_context(|| format!("Failed to load {}", opts.config_path.display()))?;
    if let Some(interface) = &opts.interface {
        vars.set(KEY_INTERFACE, interface);
    }
    if let Some(ipv4) = &opts.ipv4_address {
        vars.set(KEY_IPV4_ADDRESS, ipv4);
    }
    if let Some(dns) = &opts.dns_1 {
        vars.set(KEY_DNS_1, dns);
    }
    if let Some(dns) = &opts.dns_2 {
        vars.set(KEY_DNS_2, dns);
    }

    let decision = ipv6::choose_blocking_address(runner)?;
    if let Some(record) = decision.chosen {
        vars.set(KEY_IPV6_ADDRESS, record.address.to_string());
    }

    if vars.get(KEY_QUERY_LOGGING).is_none() {
        vars.set(KEY_QUERY_LOGGING, "true");
    }
    if vars.get(KEY_INSTALL_WEB).is_none() {
        vars.set(KEY_INSTALL_WEB, "true");
    }
    vars.save(&opts.config_path)?;

    firewall::configure(runner, prompter)?;

    let tag = engine::detect(runner)?;
    engine::fetch_and_install(&tag, fetcher, &opts.engine_install_path).await?;

    report::tick("Installation complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockBinaryFetcher;
    use crate::error::SetupError;
    use crate::prompt::MockPrompter;
    use crate::setupvars::SetupVars;
    use crate::shell::{CommandOutput, MockCommandRunner};

    fn output(success: bool, stdout: &str) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            success,
            code: Some(if success { 0 } else { 1 }),
        }
    }

    fn test_options(dir: &tempfile::TempDir) -> InstallOptions {
        InstallOptions {
            config_path: dir.path().join("setupVars.conf"),
            engine_install_path: dir.path().join("xfilter-FTL"),
            interface: Some("eth0".to_string()),
            ipv4_address: Some("192.168.1.2".to_string()),
            dns_1: Some("9.9.9.9".to_string()),
            dns_2: Some("149.112.112.112".to_string()),
            strict_package_cache: false,
        }
    }

    /// A healthy Debian host: firewalld running, SELinux absent, x86_64,
    /// one ULA address.
    fn healthy_host() -> MockCommandRunner {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_has_command()
            .returning(|name| matches!(name, "apt-get" | "firewall-cmd"));
        runner.expect_run().returning(|cmd, args| {
            let first = args.first().map(String::as_str);
            match (cmd, first) {
                ("apt-get", Some("update")) => Ok(output(true, "")),
                ("firewall-cmd", _) => Ok(output(true, "running\n")),
                ("ip", Some("-6")) => Ok(output(
                    true,
                    "inet6 fda2:2001:5555:0:d210:52fa:fe00:7ad7/64 scope global\n",
                )),
                ("uname", Some("-m")) => Ok(output(true, "x86_64\n")),
                _ => Ok(output(false, "")),
            }
        });
        runner
    }

    #[tokio::test]
    async fn test_full_pipeline_on_healthy_host() {
        let dir = tempfile::tempdir().unwrap();
        let opts = test_options(&dir);

        let runner = healthy_host();
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().returning(|_| Ok(true));
        let mut fetcher = MockBinaryFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url| url.ends_with("/xfilter-FTL-linux-x86_64"))
            .times(1)
            .returning(|_| Ok(b"engine".to_vec()));

        run_install(&runner, &prompter, &fetcher, &opts)
            .await
            .unwrap();

        let vars = SetupVars::load(&opts.config_path).unwrap();
        assert_eq!(vars.get("XFILTER_INTERFACE"), Some("eth0"));
        assert_eq!(vars.get("IPV4_ADDRESS"), Some("192.168.1.2"));
        assert_eq!(
            vars.get("IPV6_ADDRESS"),
            Some("fda2:2001:5555:0:d210:52fa:fe00:7ad7")
        );
        assert_eq!(vars.get("QUERY_LOGGING"), Some("true"));
        assert!(opts.engine_install_path.exists());
    }

    #[tokio::test]
    async fn test_unsupported_os_stops_before_any_other_stage() {
        let dir = tempfile::tempdir().unwrap();
        let opts = test_options(&dir);

        // Only the two package-manager probes are allowed; any later stage
        // touching the runner or fetcher fails the test.
        let mut runner = MockCommandRunner::new();
        runner.expect_has_command().times(2).returning(|_| false);
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(0);
        let mut fetcher = MockBinaryFetcher::new();
        fetcher.expect_fetch().times(0);

        let err = run_install(&runner, &prompter, &fetcher, &opts)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SetupError>(),
            Some(SetupError::UnsupportedOs)
        ));
        assert!(!opts.config_path.exists());
    }

    #[tokio::test]
    async fn test_unknown_architecture_never_reaches_download() {
        let dir = tempfile::tempdir().unwrap();
        let opts = test_options(&dir);

        let mut runner = MockCommandRunner::new();
        runner.expect_has_command().returning(|name| name == "apt-get");
        runner.expect_run().returning(|cmd, args| {
            let first = args.first().map(String::as_str);
            match (cmd, first) {
                ("apt-get", Some("update")) => Ok(output(true, "")),
                ("ip", Some("-6")) => Ok(output(true, "")),
                ("uname", Some("-m")) => Ok(output(true, "mips\n")),
                ("modinfo", _) => Ok(output(false, "")),
                _ => Ok(output(false, "")),
            }
        });
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(0);
        let mut fetcher = MockBinaryFetcher::new();
        fetcher.expect_fetch().times(0);

        let err = run_install(&runner, &prompter, &fetcher, &opts)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SetupError>(),
            Some(SetupError::UnknownArchitecture(raw)) if raw == "mips"
        ));
        assert!(!opts.engine_install_path.exists());
    }

    #[tokio::test]
    async fn test_package_cache_failure_is_fatal_only_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();

        let make_runner = || {
            let mut runner = MockCommandRunner::new();
            runner.expect_has_command().returning(|name| name == "apt-get");
            runner.expect_run().returning(|cmd, args| {
                let first = args.first().map(String::as_str);
                match (cmd, first) {
                    ("apt-get", Some("update")) => Ok(output(false, "")),
                    ("ip", Some("-6")) => Ok(output(true, "")),
                    ("uname", Some("-m")) => Ok(output(true, "x86_64\n")),
                    ("modinfo", _) => Ok(output(false, "")),
                    _ => Ok(output(false, "")),
                }
            });
            runner
        };
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().returning(|_| Ok(true));
        let mut fetcher = MockBinaryFetcher::new();
        fetcher.expect_fetch().returning(|_| Ok(b"engine".to_vec()));

        // Default: the failure is reported and the run continues.
        let opts = test_options(&dir);
        run_install(&make_runner(), &prompter, &fetcher, &opts)
            .await
            .unwrap();

        // Strict: the same failure aborts.
        let strict = InstallOptions {
            strict_package_cache: true,
            ..test_options(&dir)
        };
        let mut no_fetch = MockBinaryFetcher::new();
        no_fetch.expect_fetch().times(0);
        let err = run_install(&make_runner(), &prompter, &no_fetch, &strict)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SetupError>(),
            Some(SetupError::PackageCacheRefresh { .. })
        ));
    }

    #[tokio::test]
    async fn test_link_local_only_leaves_ipv6_unset() {
        let dir = tempfile::tempdir().unwrap();
        let opts = test_options(&dir);

        let mut runner = MockCommandRunner::new();
        runner.expect_has_command().returning(|name| name == "apt-get");
        runner.expect_run().returning(|cmd, args| {
            let first = args.first().map(String::as_str);
            match (cmd, first) {
                ("apt-get", Some("update")) => Ok(output(true, "")),
                ("ip", Some("-6")) => Ok(output(
                    true,
                    "inet6 fe80::d210:52fa:fe00:7ad7/64 scope link\n",
                )),
                ("uname", Some("-m")) => Ok(output(true, "x86_64\n")),
                ("modinfo", _) => Ok(output(false, "")),
                _ => Ok(output(false, "")),
            }
        });
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(0);
        let mut fetcher = MockBinaryFetcher::new();
        fetcher.expect_fetch().returning(|_| Ok(b"engine".to_vec()));

        run_install(&runner, &prompter, &fetcher, &opts)
            .await
            .unwrap();

        let vars = SetupVars::load(&opts.config_path).unwrap();
        assert_eq!(vars.get("IPV6_ADDRESS"), None);
        assert_eq!(vars.get("XFILTER_INTERFACE"), Some("eth0"));
    }
}
