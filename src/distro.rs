//! Host distribution classification.
//!
//! The installer supports the two big package-manager families. Presence of
//! the family's package tool is the signal; anything else is unsupported and
//! fatal.

use tracing::{debug, info};

use crate::error::SetupError;
use crate::report;
use crate::shell::{args_to_strings, CommandRunner};

/// Package-manager family of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistroFamily {
    /// apt-based distributions (Debian, Ubuntu, Raspbian)
    DebianLike,
    /// rpm-based distributions (CentOS, Fedora, RHEL)
    RedHatLike,
    /// Neither package manager present
    Unsupported,
}

impl DistroFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistroFamily::DebianLike => "debian-like",
            DistroFamily::RedHatLike => "redhat-like",
            DistroFamily::Unsupported => "unsupported",
        }
    }

    /// The command line that refreshes the family's package cache.
    pub fn cache_refresh_command(&self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            DistroFamily::DebianLike => Some(("apt-get", &["update"])),
            DistroFamily::RedHatLike => Some(("yum", &["makecache"])),
            DistroFamily::Unsupported => None,
        }
    }
}

impl std::fmt::Display for DistroFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify the host by probing for package-manager executables, Debian
/// family first. Derived once per run; the result never changes mid-run.
pub fn classify(runner: &dyn CommandRunner) -> Result<DistroFamily, SetupError> {
    let family = probe(runner);
    match family {
        DistroFamily::Unsupported => {
            report::cross("OS distribution not supported");
            Err(SetupError::UnsupportedOs)
        }
        found => {
            debug!("Detected {} distribution", found);
            Ok(found)
        }
    }
}

fn probe(runner: &dyn CommandRunner) -> DistroFamily {
    if runner.has_command("apt-get") {
        DistroFamily::DebianLike
    } else if runner.has_command("rpm") {
        DistroFamily::RedHatLike
    } else {
        DistroFamily::Unsupported
    }
}

/// Refresh the package cache for the classified family.
///
/// Failure is reported but non-fatal by default; the caller decides whether
/// a stale cache aborts the run.
pub fn update_package_cache(
    runner: &dyn CommandRunner,
    family: DistroFamily,
) -> Result<(), SetupError> {
    let Some((cmd, args)) = family.cache_refresh_command() else {
        return Err(SetupError::UnsupportedOs);
    };

    info!("Refreshing package cache via {}", cmd);
    let output = runner
        .run(cmd, &args_to_strings(args))
        .map_err(|e| SetupError::CommandFailed {
            command: cmd.to_string(),
            detail: e.to_string(),
        })?;

    if output.success {
        report::tick("Update local cache of available packages");
        Ok(())
    } else {
        let refresh_command = format!("{} {}", cmd, args.join(" "));
        report::cross("Update local cache of available packages");
        println!("  Error: Unable to update package cache. Please try \"{refresh_command}\"");
        Err(SetupError::PackageCacheRefresh { refresh_command })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{CommandOutput, MockCommandRunner};

    fn ok_output() -> CommandOutput {
        CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }

    fn failed_output() -> CommandOutput {
        CommandOutput {
            stdout: String::new(),
            stderr: "could not resolve mirror".to_string(),
            success: false,
            code: Some(1),
        }
    }

    #[test]
    fn test_classify_debian_like() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_has_command()
            .withf(|name| name == "apt-get")
            .times(1)
            .returning(|_| true);

        assert_eq!(classify(&runner).unwrap(), DistroFamily::DebianLike);
    }

    #[test]
    fn test_classify_redhat_like() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_has_command()
            .withf(|name| name == "apt-get")
            .times(1)
            .returning(|_| false);
        runner
            .expect_has_command()
            .withf(|name| name == "rpm")
            .times(1)
            .returning(|_| true);

        assert_eq!(classify(&runner).unwrap(), DistroFamily::RedHatLike);
    }

    #[test]
    fn test_classify_unsupported_is_fatal() {
        let mut runner = MockCommandRunner::new();
        runner.expect_has_command().times(2).returning(|_| false);

        let err = classify(&runner).unwrap_err();
        assert!(matches!(err, SetupError::UnsupportedOs));
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "OS distribution not supported");
    }

    #[test]
    fn test_debian_probe_takes_priority() {
        // Hosts carrying both managers classify as Debian-like.
        let mut runner = MockCommandRunner::new();
        runner
            .expect_has_command()
            .withf(|name| name == "apt-get")
            .times(1)
            .returning(|_| true);

        assert_eq!(classify(&runner).unwrap(), DistroFamily::DebianLike);
    }

    #[test]
    fn test_update_package_cache_success() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|cmd, args| cmd == "apt-get" && args == ["update".to_string()])
            .times(1)
            .returning(|_, _| Ok(ok_output()));

        update_package_cache(&runner, DistroFamily::DebianLike).unwrap();
    }

    #[test]
    fn test_update_package_cache_failure_is_nonfatal() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|cmd, _| cmd == "apt-get")
            .times(1)
            .returning(|_, _| Ok(failed_output()));

        let err = update_package_cache(&runner, DistroFamily::DebianLike).unwrap_err();
        assert!(matches!(err, SetupError::PackageCacheRefresh { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_redhat_cache_refresh_uses_yum() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|cmd, args| cmd == "yum" && args == ["makecache".to_string()])
            .times(1)
            .returning(|_, _| Ok(ok_output()));

        update_package_cache(&runner, DistroFamily::RedHatLike).unwrap();
    }
}
