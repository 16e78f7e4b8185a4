//! Local address resolution

use crate::{PodSetError, Result};
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

/// Resolve this machine's hostname to an IP address.
///
/// IPv4 results are preferred since pod IPs reported for the worker set are
/// compared as plain strings.
pub async fn resolve_local_ip() -> Result<IpAddr> {
    let name = hostname::get()?
        .into_string()
        .map_err(|_| PodSetError::LocalAddress("hostname is not valid UTF-8".to_string()))?;

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((name.as_str(), 0))
        .await
        .map_err(|e| PodSetError::LocalAddress(format!("Failed to resolve {}: {}", name, e)))?
        .collect();

    let ip = pick_address(&addrs)
        .ok_or_else(|| PodSetError::LocalAddress(format!("{} has no addresses", name)))?;

    debug!("Resolved local host {} to {}", name, ip);
    Ok(ip)
}

fn pick_address(addrs: &[SocketAddr]) -> Option<IpAddr> {
    addrs
        .iter()
        .map(SocketAddr::ip)
        .find(IpAddr::is_ipv4)
        .or_else(|| addrs.first().map(SocketAddr::ip))
}
