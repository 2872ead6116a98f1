use anyhow::Context;
use dug_common::config::secs_to_duration;
use dug_core::resolver;
use tracing::info;

use crate::commands::LookupArgs;

pub async fn lookup(args: LookupArgs) -> anyhow::Result<()> {
    let timeout = secs_to_duration(args.timeout);
    let addrs = resolver::lookup_host(&args.host, timeout)
        .await
        .context("name resolution failed")?;

    for addr in &addrs {
        info!(target: "dug::lookup", host = %args.host, %addr, "resolved");
    }
    Ok(())
}
