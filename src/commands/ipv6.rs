//! IPv6 blocking-address selection command.

use anyhow::Result;
use tracing::info;

use crate::ipv6;
use crate::shell::RealCommandRunner;

pub async fn run() -> Result<()> {
    let runner = RealCommandRunner::new();
    let decision = ipv6::choose_blocking_address(&runner)?;
    if let Some(record) = decision.chosen {
        info!("Selected {} address {}", record.kind.as_str(), record.address);
    }
    Ok(())
}
