//! FTL engine binary selection and retrieval.
//!
//! The filtering engine ships as prebuilt binaries per CPU/ABI combination.
//! Detection fuses two signals: the machine-hardware identifier from
//! `uname -m` and, for 32-bit ARM, the dynamic-loader path reported by
//! `ldd /bin/ls` (the hard-float loader distinguishes the gnueabihf builds).
//! The mapping itself is a pure function so the decision table is testable
//! without touching the host.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use crate::error::SetupError;
use crate::report;
use crate::shell::{args_to_strings, CommandRunner};

const TIMEOUT_SECS: u64 = 30;

/// Fixed release location for engine binaries.
pub const RELEASE_BASE_URL: &str = "https://github.com/x-filter/FTL/releases/download";

/// Release tag the installer pins to.
pub const RELEASE_TAG: &str = "v4.0";

/// Where the engine binary lands on the host.
pub const INSTALL_PATH: &str = "/usr/bin/xfilter-FTL";

/// CPU/ABI combination of the host, as far as the engine cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchitectureTag {
    Aarch64,
    /// 32-bit ARM, ARMv6 or lower (or no hard-float loader present)
    ArmHfLow,
    /// 32-bit ARM, ARMv7 and above with hard-float loader
    ArmHfHigh,
    X86_64,
    /// Unrecognized machine-hardware identifier; fatal, never fetched
    Unknown(String),
}

/// Pure two-signal mapping from host signals to an architecture tag.
///
/// `machine` is the trimmed `uname -m` value; `loader` is the dynamic-loader
/// report for a reference binary and is only consulted for ARM identifiers.
pub fn resolve_architecture(machine: &str, loader: &str) -> ArchitectureTag {
    if machine == "aarch64" {
        return ArchitectureTag::Aarch64;
    }

    if machine.starts_with("arm") {
        if loader.contains("ld-linux-armhf") {
            let revision: u32 = machine
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect::<String>()
                .parse()
                .unwrap_or(0);
            if revision > 6 {
                return ArchitectureTag::ArmHfHigh;
            }
        }
        // armv6 and lower share the soft-float-compatible build
        return ArchitectureTag::ArmHfLow;
    }

    if machine == "x86_64" {
        return ArchitectureTag::X86_64;
    }

    ArchitectureTag::Unknown(machine.to_string())
}

/// Artifact name for a resolved tag. Total over the four known tags;
/// `Unknown` has no artifact and must never reach the fetch step.
pub fn artifact_name(tag: &ArchitectureTag) -> Option<&'static str> {
    match tag {
        ArchitectureTag::Aarch64 => Some("xfilter-FTL-aarch64-linux-gnu"),
        ArchitectureTag::ArmHfLow => Some("xfilter-FTL-arm-linux-gnueabi"),
        ArchitectureTag::ArmHfHigh => Some("xfilter-FTL-arm-linux-gnueabihf"),
        ArchitectureTag::X86_64 => Some("xfilter-FTL-linux-x86_64"),
        ArchitectureTag::Unknown(_) => None,
    }
}

/// Download URL for a named engine binary.
pub fn artifact_url(binary: &str) -> String {
    format!("{}/{}/{}", RELEASE_BASE_URL, RELEASE_TAG, binary)
}

fn detection_message(tag: &ArchitectureTag) -> Option<&'static str> {
    match tag {
        ArchitectureTag::Aarch64 => Some("Detected ARM-aarch64 architecture"),
        ArchitectureTag::ArmHfLow => Some("Detected ARM-hf architecture (armv6 or lower)"),
        ArchitectureTag::ArmHfHigh => Some("Detected ARM-hf architecture (armv7+)"),
        ArchitectureTag::X86_64 => Some("Detected x86_64 architecture"),
        ArchitectureTag::Unknown(_) => None,
    }
}

/// Gather the two host signals and resolve the architecture tag.
///
/// An unrecognized identifier is fatal: the failure line carries the raw
/// string for diagnosis and no download is attempted.
pub fn detect(runner: &dyn CommandRunner) -> Result<ArchitectureTag, SetupError> {
    report::info("FTL Checks...");

    let machine_out =
        runner
            .run("uname", &args_to_strings(&["-m"]))
            .map_err(|e| SetupError::CommandFailed {
                command: "uname".to_string(),
                detail: e.to_string(),
            })?;
    let machine = machine_out.stdout.trim().to_string();

    // Loader probe only matters for 32-bit ARM disambiguation.
    let loader = if machine.starts_with("arm") {
        runner
            .run("ldd", &args_to_strings(&["/bin/ls"]))
            .map(|o| o.stdout)
            .unwrap_or_default()
    } else {
        String::new()
    };

    let tag = resolve_architecture(&machine, &loader);
    match detection_message(&tag) {
        Some(msg) => {
            report::tick(msg);
            Ok(tag)
        }
        None => {
            report::cross(&format!(
                "Not able to detect architecture (unknown: {})",
                machine
            ));
            Err(SetupError::UnknownArchitecture(machine))
        }
    }
}

/// Artifact-retrieval transport. A trait so tests can script the remote
/// release location.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BinaryFetcher: Send + Sync {
    /// Fetch an artifact. A missing remote artifact is
    /// `SetupError::DownloadNotFound` carrying the attempted URL.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SetupError>;
}

/// HTTP transport for the release location.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, SetupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(format!("xfilter-setup/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SetupError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BinaryFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SetupError> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SetupError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SetupError::DownloadNotFound {
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SetupError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Fetch the artifact for a resolved tag and install it.
pub async fn fetch_and_install(
    tag: &ArchitectureTag,
    fetcher: &dyn BinaryFetcher,
    dest: &Path,
) -> Result<(), SetupError> {
    let binary = match artifact_name(tag) {
        Some(binary) => binary,
        None => {
            let raw = match tag {
                ArchitectureTag::Unknown(raw) => raw.clone(),
                _ => unreachable!("artifact mapping is total over known tags"),
            };
            return Err(SetupError::UnknownArchitecture(raw));
        }
    };
    install_binary(binary, fetcher, dest).await
}

/// Download a named engine binary into place and mark it executable.
pub async fn install_binary(
    binary: &str,
    fetcher: &dyn BinaryFetcher,
    dest: &Path,
) -> Result<(), SetupError> {
    let url = artifact_url(binary);
    match fetcher.fetch(&url).await {
        Ok(bytes) => {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(dest, bytes)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o755))?;
            }
            report::tick("Downloading and Installing FTL");
            info!("Installed engine binary at {}", dest.display());
            Ok(())
        }
        Err(SetupError::DownloadNotFound { url }) => {
            report::cross("Downloading and Installing FTL");
            println!("  Error: URL {} not found", url);
            Err(SetupError::DownloadNotFound { url })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{CommandOutput, MockCommandRunner};

    const HF_LOADER: &str = "/lib/ld-linux-armhf.so.3 (0xb6f00000)";

    fn uname_says(machine: &'static str) -> MockCommandRunner {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|cmd, args| cmd == "uname" && args == ["-m".to_string()])
            .returning(move |_, _| {
                Ok(CommandOutput {
                    stdout: format!("{}\n", machine),
                    stderr: String::new(),
                    success: true,
                    code: Some(0),
                })
            });
        runner
    }

    #[test]
    fn test_resolve_aarch64() {
        assert_eq!(
            resolve_architecture("aarch64", "/lib/ld-linux-aarch64.so.1"),
            ArchitectureTag::Aarch64
        );
    }

    #[test]
    fn test_resolve_armv6_hard_float() {
        assert_eq!(
            resolve_architecture("armv6l", HF_LOADER),
            ArchitectureTag::ArmHfLow
        );
    }

    #[test]
    fn test_resolve_armv7_hard_float() {
        assert_eq!(
            resolve_architecture("armv7l", HF_LOADER),
            ArchitectureTag::ArmHfHigh
        );
    }

    #[test]
    fn test_resolve_arm_soft_float_uses_low_build() {
        assert_eq!(
            resolve_architecture("armv7l", "/lib/ld-linux.so.3"),
            ArchitectureTag::ArmHfLow
        );
    }

    #[test]
    fn test_resolve_x86_64() {
        assert_eq!(resolve_architecture("x86_64", ""), ArchitectureTag::X86_64);
    }

    #[test]
    fn test_resolve_unknown_keeps_raw_identifier() {
        assert_eq!(
            resolve_architecture("mips", ""),
            ArchitectureTag::Unknown("mips".to_string())
        );
    }

    #[test]
    fn test_artifact_mapping_is_total_over_known_tags() {
        for tag in [
            ArchitectureTag::Aarch64,
            ArchitectureTag::ArmHfLow,
            ArchitectureTag::ArmHfHigh,
            ArchitectureTag::X86_64,
        ] {
            assert!(artifact_name(&tag).is_some());
        }
        assert_eq!(artifact_name(&ArchitectureTag::Unknown("mips".into())), None);
    }

    #[test]
    fn test_artifact_url() {
        assert_eq!(
            artifact_url("xfilter-FTL-aarch64-linux-gnu"),
            "https://github.com/x-filter/FTL/releases/download/v4.0/xfilter-FTL-aarch64-linux-gnu"
        );
    }

    #[test]
    fn test_detect_aarch64_skips_loader_probe() {
        let runner = uname_says("aarch64");
        assert_eq!(detect(&runner).unwrap(), ArchitectureTag::Aarch64);
    }

    #[test]
    fn test_detect_arm_consults_loader() {
        let mut runner = uname_says("armv7l");
        runner
            .expect_run()
            .withf(|cmd, args| cmd == "ldd" && args == ["/bin/ls".to_string()])
            .times(1)
            .returning(|_, _| {
                Ok(CommandOutput {
                    stdout: format!("\t{}\n", HF_LOADER),
                    stderr: String::new(),
                    success: true,
                    code: Some(0),
                })
            });

        assert_eq!(detect(&runner).unwrap(), ArchitectureTag::ArmHfHigh);
    }

    #[test]
    fn test_detect_unknown_is_fatal() {
        let runner = uname_says("mips");
        let err = detect(&runner).unwrap_err();
        assert!(matches!(err, SetupError::UnknownArchitecture(ref raw) if raw == "mips"));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_install_binary_writes_executable() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("xfilter-FTL");

        let mut fetcher = MockBinaryFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url| url.ends_with("/xfilter-FTL-linux-x86_64"))
            .times(1)
            .returning(|_| Ok(b"\x7fELF-engine".to_vec()));

        install_binary("xfilter-FTL-linux-x86_64", &fetcher, &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"\x7fELF-engine");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[tokio::test]
    async fn test_install_binary_missing_artifact_carries_url() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("xfilter-FTL");

        let mut fetcher = MockBinaryFetcher::new();
        fetcher.expect_fetch().times(1).returning(|url| {
            Err(SetupError::DownloadNotFound {
                url: url.to_string(),
            })
        });

        let err = install_binary("xfilter-FTL-mips", &fetcher, &dest)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("https://github.com/x-filter/FTL/releases/download/"));
        assert!(msg.contains("xfilter-FTL-mips"));
        assert!(msg.contains("not found"));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_and_install_refuses_unknown_tag() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = MockBinaryFetcher::new();
        fetcher.expect_fetch().times(0);

        let err = fetch_and_install(
            &ArchitectureTag::Unknown("mips".into()),
            &fetcher,
            &dir.path().join("xfilter-FTL"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SetupError::UnknownArchitecture(_)));
    }
}
