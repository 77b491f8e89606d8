use std::net::{Ipv4Addr, SocketAddr};

use log::debug;
use tokio::net::lookup_host;

use crate::error::SourceQueryError;

const CONNECT_SCHEME: &str = "steam://connect/";

/// Split a server address into host and port.
///
/// Accepts `host:port`, `host,port`, `[v6]:port` and any of these behind a
/// `steam://connect/` prefix.
pub fn parse_address(address: &str) -> Result<(String, u16), SourceQueryError> {
    let address: &str = address.trim();
    let address: &str = address.strip_prefix(CONNECT_SCHEME).unwrap_or(address);
    let address: &str = address.trim_end_matches('/');

    let (host, port) = address
        .rsplit_once([':', ','])
        .ok_or_else(|| SourceQueryError::InvalidAddress(address.to_owned()))?;

    let host: &str = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    validate_host(host)?;

    let port: u16 = port
        .parse()
        .map_err(|_| SourceQueryError::InvalidPort(port.to_owned()))?;

    Ok((host.to_owned(), port))
}

fn validate_host(host: &str) -> Result<(), SourceQueryError> {
    let invalid = || SourceQueryError::InvalidAddress(host.to_owned());

    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    // anything that looks like a dotted quad has to be a real one
    let looks_numeric: bool = host.split('.').count() == 4
        && host.split('.').all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    if looks_numeric && host.parse::<Ipv4Addr>().is_err() {
        return Err(invalid());
    }
    Ok(())
}

/// Parse and resolve `address`, taking the first address the resolver returns.
pub async fn resolve(address: &str) -> Result<SocketAddr, SourceQueryError> {
    let (host, port) = parse_address(address)?;
    resolve_host(&host, port).await
}

pub async fn resolve_host(host: &str, port: u16) -> Result<SocketAddr, SourceQueryError> {
    let addr: SocketAddr = lookup_host((host, port))
        .await
        .map_err(|_| SourceQueryError::Unresolvable(host.to_owned()))?
        .next()
        .ok_or_else(|| SourceQueryError::Unresolvable(host.to_owned()))?;
    debug!("resolved {}:{} to {}", host, port, addr);
    Ok(addr)
}
