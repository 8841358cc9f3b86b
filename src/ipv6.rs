//! IPv6 address classification and blocking-address selection.
//!
//! The appliance can answer ad queries on IPv6 only if the host has a stable
//! global-scope address. Unique-local addresses are preferred over global
//! unicast because they survive prefix changes from the ISP; link-local
//! addresses are unusable for this purpose and ignored.

use std::net::Ipv6Addr;
use tracing::debug;

use crate::error::SetupError;
use crate::shell::{args_to_strings, CommandRunner};

/// Classification of one host address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ipv6Kind {
    /// Unique Local Address (fc00::/7)
    Ula,
    /// Global Unicast Address
    Gua,
    /// Link-local (fe80::/10 or reported with link scope)
    LinkLocal,
}

impl Ipv6Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ipv6Kind::Ula => "ULA",
            Ipv6Kind::Gua => "GUA",
            Ipv6Kind::LinkLocal => "link-local",
        }
    }
}

/// One parsed entry from the host's IPv6 address report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Record {
    pub address: Ipv6Addr,
    pub kind: Ipv6Kind,
}

/// Outcome of address selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Decision {
    pub enable: bool,
    pub chosen: Option<Ipv6Record>,
}

/// Classify an address by prefix.
pub fn classify(address: &Ipv6Addr) -> Ipv6Kind {
    let first = address.segments()[0];
    if first & 0xffc0 == 0xfe80 {
        Ipv6Kind::LinkLocal
    } else if first & 0xfe00 == 0xfc00 {
        Ipv6Kind::Ula
    } else {
        Ipv6Kind::Gua
    }
}

/// Parse `ip -6 address` output into classified records.
///
/// Lines look like `inet6 fda2:2001:5555::7ad7/64 scope global`; records
/// reported with link scope classify as link-local regardless of prefix.
pub fn parse_address_report(output: &str) -> Vec<Ipv6Record> {
    let mut records = Vec::new();
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(pos) = tokens.iter().position(|t| *t == "inet6") else {
            continue;
        };
        let Some(addr_token) = tokens.get(pos + 1) else {
            continue;
        };
        let addr_part = addr_token.split('/').next().unwrap_or(addr_token);
        let Ok(address) = addr_part.parse::<Ipv6Addr>() else {
            continue;
        };

        let scope = tokens
            .iter()
            .position(|t| *t == "scope")
            .and_then(|i| tokens.get(i + 1))
            .copied()
            .unwrap_or("global");

        let kind = if scope == "link" {
            Ipv6Kind::LinkLocal
        } else {
            classify(&address)
        };
        records.push(Ipv6Record { address, kind });
    }
    records
}

/// Selection policy: the first ULA wins, regardless of where it appears in
/// the report; otherwise the first GUA; otherwise IPv6 blocking is disabled.
pub fn select(records: &[Ipv6Record]) -> Ipv6Decision {
    if let Some(record) = records.iter().find(|r| r.kind == Ipv6Kind::Ula) {
        return Ipv6Decision {
            enable: true,
            chosen: Some(*record),
        };
    }
    if let Some(record) = records.iter().find(|r| r.kind == Ipv6Kind::Gua) {
        return Ipv6Decision {
            enable: true,
            chosen: Some(*record),
        };
    }
    Ipv6Decision {
        enable: false,
        chosen: None,
    }
}

/// Read the host's IPv6 addresses and pick a blocking address.
pub fn choose_blocking_address(runner: &dyn CommandRunner) -> Result<Ipv6Decision, SetupError> {
    let output = runner
        .run("ip", &args_to_strings(&["-6", "address"]))
        .map_err(|e| SetupError::CommandFailed {
            command: "ip -6 address".to_string(),
            detail: e.to_string(),
        })?;

    let records = parse_address_report(&output.stdout);
    debug!("Found {} IPv6 address record(s)", records.len());

    let decision = select(&records);
    match decision.chosen {
        Some(record) if record.kind == Ipv6Kind::Ula => {
            println!("Found IPv6 ULA address, using it for blocking IPv6 ads");
        }
        Some(_) => {
            println!("Found IPv6 GUA address, using it for blocking IPv6 ads");
        }
        None => {
            println!("Unable to find IPv6 ULA/GUA address, IPv6 adblocking will not be enabled");
        }
    }
    Ok(decision)
}
