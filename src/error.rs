use std::io;

use thiserror::Error;

/// A trace error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A trace error.
///
/// Only session-fatal conditions live here. Per-round timeouts and failed
/// reverse lookups are data, not errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("need root or CAP_NET_RAW to open the raw ICMP socket")]
    MissingPrivilege,
    #[cfg(target_os = "linux")]
    #[error("capability check failed: {0}")]
    Caps(#[from] caps::errors::CapsError),
    #[error("could not resolve {host}: {source}")]
    Resolution { host: String, source: io::Error },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
