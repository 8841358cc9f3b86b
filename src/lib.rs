//! # xfilter-setup - Host Provisioning for the xfilter Appliance
//!
//! Unattended installer for a local DNS-based ad/content-filtering
//! appliance. The installer probes the host through a small set of OS
//! utilities and decides how to configure it: which package-manager family
//! it belongs to, whether SELinux permits installation, which firewall
//! backend to program, which prebuilt engine binary matches the CPU/ABI,
//! and whether IPv6 filtering can be enabled.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      xfilter-setup                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                              │
//! │    └── Commands: install, distro, selinux, firewall,     │
//! │                  engine, ipv6                            │
//! ├──────────────────────────────────────────────────────────┤
//! │  Installer pipeline (sequential, fatal-abort)            │
//! │    distro → package cache → selinux → ipv6 →             │
//! │    setupVars → firewall → engine                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  Ports                                                   │
//! │    ├── CommandRunner (std::process, mockable)            │
//! │    ├── Prompter (dialoguer, mockable)                    │
//! │    └── BinaryFetcher (reqwest, mockable)                 │
//! ├──────────────────────────────────────────────────────────┤
//! │  SetupVars (flat KEY=VALUE file, full rewrite per run)   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Firewall rule application is check-before-mutate: re-running the
//! configurator against a host that already carries the ruleset issues
//! zero inserts. All host probing is re-derived from the live system on
//! every run; nothing is cached in-process between runs.
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`distro`] - Package-manager family classification
//! - [`engine`] - Architecture resolution and engine binary retrieval
//! - [`error`] - Error taxonomy and fatality classification
//! - [`firewall`] - Backend detection and idempotent rule application
//! - [`installer`] - The sequential installation pipeline
//! - [`ipv6`] - IPv6 address classification and selection
//! - [`prompt`] - Confirmation gates
//! - [`report`] - User-visible status lines
//! - [`selinux`] - SELinux posture gate
//! - [`setupvars`] - Persisted setup variables
//! - [`shell`] - Command execution port

pub mod cli;
pub mod commands;
pub mod distro;
pub mod engine;
pub mod error;
pub mod firewall;
pub mod installer;
pub mod ipv6;
pub mod prompt;
pub mod report;
pub mod selinux;
pub mod setupvars;
pub mod shell;

pub use cli::{Cli, Commands, EngineAction};
pub use error::SetupError;
