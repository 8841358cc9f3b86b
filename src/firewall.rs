//! Firewall backend detection and idempotent rule application.
//!
//! Two mutually exclusive backends are supported: FirewallD (queried first)
//! and plain IPTables (entered only when FirewallD is absent or inactive and
//! the ip_tables kernel module is loadable). Rule application is declarative
//! and check-before-mutate, so re-running the configurator against a host
//! that already carries the ruleset issues no inserts.

use anyhow::Result;
use tracing::debug;

use crate::error::SetupError;
use crate::prompt::Prompter;
use crate::report;
use crate::shell::{args_to_strings, CommandOutput, CommandRunner};

/// Firewall management subsystem active on the host, selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallBackend {
    None,
    FirewallD,
    IPTables,
}

impl FirewallBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            FirewallBackend::None => "none",
            FirewallBackend::FirewallD => "FirewallD",
            FirewallBackend::IPTables => "IPTables",
        }
    }
}

impl std::fmt::Display for FirewallBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

/// One declarative firewall rule: protocol, destination port or range,
/// and what it is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirewallRule {
    pub protocol: Protocol,
    pub port: &'static str,
    pub description: &'static str,
}

impl std::fmt::Display for FirewallRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} ({})",
            self.protocol.as_str(),
            self.port,
            self.description
        )
    }
}

/// The fixed ruleset the appliance needs: web interface, DNS over both
/// protocols, and the engine API port range.
pub const REQUIRED_RULES: [FirewallRule; 4] = [
    FirewallRule {
        protocol: Protocol::Tcp,
        port: "80",
        description: "web interface",
    },
    FirewallRule {
        protocol: Protocol::Tcp,
        port: "53",
        description: "DNS over TCP",
    },
    FirewallRule {
        protocol: Protocol::Udp,
        port: "53",
        description: "DNS over UDP",
    },
    FirewallRule {
        protocol: Protocol::Tcp,
        port: "4711:4720",
        description: "FTL engine API",
    },
];

/// Result of a configuration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallOutcome {
    /// Rules were verified or applied on the named backend.
    Applied(FirewallBackend),
    /// The operator declined the ruleset.
    Declined,
    /// Neither backend is usable; nothing was changed.
    NoActiveFirewall,
}

const RULESET_PROMPT: &str =
    "xfilter needs HTTP and DNS traffic permitted through the firewall. \
     Install the default firewall rules?";

/// Ordered capability probe: FirewallD state first, then the ip_tables
/// kernel module. Detection is re-derived from the live host on every run;
/// nothing is cached in-process.
pub fn detect_backend(runner: &dyn CommandRunner) -> FirewallBackend {
    if runner.has_command("firewall-cmd") {
        match runner.run("firewall-cmd", &args_to_strings(&["--state"])) {
            Ok(output) if output.success => return FirewallBackend::FirewallD,
            Ok(_) => debug!("firewalld present but not running"),
            Err(e) => debug!("firewall-cmd probe failed: {}", e),
        }
    }

    let module_loadable = runner
        .run("modinfo", &args_to_strings(&["ip_tables"]))
        .map(|o| o.success)
        .unwrap_or(false);
    if module_loadable && runner.has_command("iptables") {
        return FirewallBackend::IPTables;
    }

    FirewallBackend::None
}

/// Detect the backend and bring the required ruleset into effect.
pub fn configure(
    runner: &dyn CommandRunner,
    prompter: &dyn Prompter,
) -> Result<FirewallOutcome, SetupError> {
    match detect_backend(runner) {
        FirewallBackend::FirewallD => configure_firewalld(runner, prompter),
        FirewallBackend::IPTables => configure_iptables(runner, prompter),
        FirewallBackend::None => {
            report::info("No active firewall detected.. skipping firewall configuration");
            Ok(FirewallOutcome::NoActiveFirewall)
        }
    }
}

fn confirm_ruleset(prompter: &dyn Prompter) -> Result<bool, SetupError> {
    prompter
        .confirm(RULESET_PROMPT)
        .map_err(|e| SetupError::CommandFailed {
            command: "confirmation prompt".to_string(),
            detail: e.to_string(),
        })
}

/// FirewallD path: the http and dns services cover tcp/80 and both dns
/// rules; the engine API range is added as a permanent port. One reload
/// makes the permanent configuration live.
fn configure_firewalld(
    runner: &dyn CommandRunner,
    prompter: &dyn Prompter,
) -> Result<FirewallOutcome, SetupError> {
    if !confirm_ruleset(prompter)? {
        println!("Not installing firewall rulesets.");
        return Ok(FirewallOutcome::Declined);
    }

    println!("Configuring FirewallD for httpd and xfilter-FTL");
    run_checked(
        runner,
        "firewall-cmd",
        &["--permanent", "--add-service=http", "--add-service=dns"],
    )?;
    run_checked(runner, "firewall-cmd", &["--permanent", "--add-port=4711-4720/tcp"])?;
    run_checked(runner, "firewall-cmd", &["--reload"])?;

    report::tick("Firewall rules applied via FirewallD");
    Ok(FirewallOutcome::Applied(FirewallBackend::FirewallD))
}

/// IPTables path: one listing per run for diagnostics, then a
/// check-then-insert pass per rule so repeated runs stay idempotent.
fn configure_iptables(
    runner: &dyn CommandRunner,
    prompter: &dyn Prompter,
) -> Result<FirewallOutcome, SetupError> {
    if !confirm_ruleset(prompter)? {
        println!("Not installing firewall rulesets.");
        return Ok(FirewallOutcome::Declined);
    }

    println!("Installing new IPTables firewall rulesets");
    let listing = run_checked(runner, "iptables", &["-S"])?;
    debug!("Current ruleset:\n{}", listing.stdout.trim_end());

    for rule in &REQUIRED_RULES {
        ensure_rule(runner, rule)?;
    }

    report::tick("Firewall rules applied via IPTables");
    Ok(FirewallOutcome::Applied(FirewallBackend::IPTables))
}

/// Pure existence query for one rule. `iptables -C` exits zero when the
/// rule is already present.
fn rule_is_present(runner: &dyn CommandRunner, rule: &FirewallRule) -> Result<bool, SetupError> {
    let output = runner
        .run("iptables", &rule_args("-C", rule))
        .map_err(|e| SetupError::CommandFailed {
            command: "iptables".to_string(),
            detail: e.to_string(),
        })?;
    Ok(output.success)
}

/// Insert one rule at the top of the INPUT chain.
fn insert_rule(runner: &dyn CommandRunner, rule: &FirewallRule) -> Result<(), SetupError> {
    run_checked_args(runner, "iptables", rule_args("-I", rule))?;
    Ok(())
}

/// Ensure-present: check, then insert only when the check reports absence.
fn ensure_rule(runner: &dyn CommandRunner, rule: &FirewallRule) -> Result<(), SetupError> {
    if rule_is_present(runner, rule)? {
        debug!("Rule {} already present, skipping", rule);
        return Ok(());
    }
    debug!("Inserting rule {}", rule);
    insert_rule(runner, rule)
}

fn rule_args(action: &str, rule: &FirewallRule) -> Vec<String> {
    let mut args = vec![action.to_string(), "INPUT".to_string()];
    if action == "-I" {
        args.push("1".to_string());
    }
    args.extend(
        ["-p", rule.protocol.as_str(), "--dport", rule.port, "-j", "ACCEPT"]
            .iter()
            .map(|s| s.to_string()),
    );
    args
}

fn run_checked(
    runner: &dyn CommandRunner,
    cmd: &str,
    args: &[&str],
) -> Result<CommandOutput, SetupError> {
    run_checked_args(runner, cmd, args_to_strings(args))
}

fn run_checked_args(
    runner: &dyn CommandRunner,
    cmd: &str,
    args: Vec<String>,
) -> Result<CommandOutput, SetupError> {
    let output = runner.run(cmd, &args).map_err(|e| SetupError::CommandFailed {
        command: cmd.to_string(),
        detail: e.to_string(),
    })?;
    if !output.success {
        return Err(SetupError::CommandFailed {
            command: format!("{} {}", cmd, args.join(" ")),
            detail: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}
