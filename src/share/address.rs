//! Local address discovery.
//!
//! Resolves the host's own name and picks the first non-loopback IPv4
//! address, which is what a recipient on the same network can reach.

use crate::error::{AppError, AppResult};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::debug;

/// Resolve a non-loopback IPv4 address for this host.
///
/// Runs once at startup; any failure is fatal for the run.
pub async fn resolve_local_ipv4() -> AppResult<Ipv4Addr> {
    let hostname = nix::unistd::gethostname()
        .map_err(|e| AppError::address_resolution(format!("hostname lookup failed: {}", e)))?;
    let hostname = hostname.to_string_lossy().into_owned();
    debug!("Resolving addresses for host {}", hostname);

    let addrs = tokio::net::lookup_host((hostname.as_str(), 0))
        .await
        .map_err(|e| {
            AppError::address_resolution(format!("could not resolve {}: {}", hostname, e))
        })?;

    first_non_loopback_ipv4(addrs.map(|addr: SocketAddr| addr.ip())).ok_or_else(|| {
        AppError::address_resolution(format!("no non-loopback IPv4 address for {}", hostname))
    })
}

/// Pick the first IPv4 candidate that is not loopback, in resolver order.
pub fn first_non_loopback_ipv4<I>(candidates: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    candidates.into_iter().find_map(|ip| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() => Some(v4),
        // IPv4-mapped IPv6 counts as IPv4
        IpAddr::V6(v6) => v6.to_ipv4_mapped().filter(|v4| !v4.is_loopback()),
        _ => None,
    })
}
