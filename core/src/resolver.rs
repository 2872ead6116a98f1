//! Plain host name lookup bounded by a timeout.

use std::{io, net::IpAddr, time::Duration};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup of {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },
    #[error("lookup of {host} failed: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },
}

/// Resolves `host` through the system resolver, giving up after `timeout`.
///
/// Addresses come back in resolver order with duplicates removed.
pub async fn lookup_host(host: &str, timeout: Duration) -> Result<Vec<IpAddr>, LookupError> {
    let lookup = tokio::net::lookup_host((host, 0));
    let addrs = tokio::time::timeout(timeout, lookup)
        .await
        .map_err(|_| LookupError::Timeout {
            host: host.to_string(),
            timeout,
        })?
        .map_err(|source| LookupError::Resolve {
            host: host.to_string(),
            source,
        })?;

    let mut ips: Vec<IpAddr> = Vec::new();
    for addr in addrs {
        if !ips.contains(&addr.ip()) {
            ips.push(addr.ip());
        }
    }
    debug!(host, count = ips.len(), "lookup finished");
    Ok(ips)
}
