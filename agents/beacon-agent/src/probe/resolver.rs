//! Local IP Resolver
//!
//! Learns which local address the OS picks for outbound traffic by
//! connecting to a reachable host and reading back the local endpoint.
//! No bytes are exchanged over the connection.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ResolverError;

/// Bound on name resolution plus the TCP handshake
pub const LOOKUP_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Resolve the outbound local IP by connecting to `lookup_addr`
///
/// Returns the address in text form, including the IPv6 zone when the
/// route is link-local (see [`host_literal`]).
pub async fn resolve_local_ip(lookup_addr: &str) -> Result<String, ResolverError> {
    let stream = timeout(LOOKUP_CONNECT_TIMEOUT, TcpStream::connect(lookup_addr))
        .await
        .map_err(|_| ResolverError::Timeout {
            addr: lookup_addr.to_string(),
        })?
        .map_err(|source| ResolverError::Connect {
            addr: lookup_addr.to_string(),
            source,
        })?;

    // The stream is dropped (and the socket closed) on return either way
    let local = stream.local_addr().map_err(ResolverError::LocalAddr)?;
    debug!(lookup_addr = %lookup_addr, local = %local, "Resolved local endpoint");

    Ok(host_literal(&local))
}

/// Host part of a socket address, without brackets or port
///
/// An IPv6 address with a non-zero scope id keeps its zone as `%<index>`.
/// The zone is the numeric interface index; the OS socket address carries
/// no interface name.
pub fn host_literal(addr: &SocketAddr) -> String {
    match addr {
        SocketAddr::V6(v6) if v6.scope_id() != 0 => format!("{}%{}", v6.ip(), v6.scope_id()),
        _ => addr.ip().to_string(),
    }
}
