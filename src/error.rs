//! Error types for xfilter-setup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("OS distribution not supported")]
    UnsupportedOs,

    #[error("SELinux Enforcing detected, exiting installer")]
    SelinuxDeclined,

    #[error("SELinux mode could not be determined, aborting on operator request")]
    SelinuxUnresolved,

    #[error("Not able to detect architecture (unknown: {0})")]
    UnknownArchitecture(String),

    #[error("URL {url} not found")]
    DownloadNotFound { url: String },

    #[error("Unable to update package cache. Please try \"{refresh_command}\"")]
    PackageCacheRefresh { refresh_command: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("{command} failed: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SetupError {
    /// Whether this condition must abort the remaining pipeline stages.
    ///
    /// Non-fatal conditions degrade a feature and let the run continue;
    /// everything else terminates the installer with exit code 1.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SetupError::PackageCacheRefresh { .. })
    }
}
