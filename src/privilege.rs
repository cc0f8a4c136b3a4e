use crate::error::{Error, Result};

/// Check that the process may open raw ICMP sockets.
///
/// On Linux `CAP_NET_RAW` must be in the effective set. On other Unix
/// platforms the effective user must be root. Called once at startup,
/// before any network activity.
pub fn ensure_raw_socket_privilege() -> Result<()> {
    if has_privileges()? {
        Ok(())
    } else {
        Err(Error::MissingPrivilege)
    }
}

#[cfg(target_os = "linux")]
fn has_privileges() -> Result<bool> {
    Ok(caps::has_cap(
        None,
        caps::CapSet::Effective,
        caps::Capability::CAP_NET_RAW,
    )?)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn has_privileges() -> Result<bool> {
    Ok(nix::unistd::Uid::effective().is_root())
}

#[cfg(not(unix))]
fn has_privileges() -> Result<bool> {
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_does_not_fail() {
        has_privileges().unwrap();
    }
}
