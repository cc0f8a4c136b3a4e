use std::io;
use std::net::{IpAddr, Ipv4Addr};

use crate::error::{Error, Result};

/// Display name used when a responder has no reverse DNS entry.
pub const UNKNOWN_HOSTNAME: &str = "Unknown hostname";

/// Resolve a destination hostname or IPv4 literal to a routable address.
///
/// Failure is fatal to the session; the caller aborts the whole trace.
pub fn resolve(host: &str) -> Result<Ipv4Addr> {
    let addrs = dns_lookup::lookup_host(host).map_err(|source| Error::Resolution {
        host: host.to_string(),
        source,
    })?;
    addrs
        .into_iter()
        .find_map(|addr| match addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| Error::Resolution {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no IPv4 address"),
        })
}

/// Reverse lookup of a responder address. Never escalates: a missing PTR
/// record falls back to the sentinel name.
pub fn reverse_lookup(addr: Ipv4Addr) -> String {
    dns_lookup::lookup_addr(&addr.into()).unwrap_or_else(|_| UNKNOWN_HOSTNAME.to_string())
}
