use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::time::Instant;

use tracing::debug;

/// Destination port for outbound probes. Nothing listens there; discovery
/// data arrives on the separate ICMP channel, never on this port.
pub const PROBE_PORT: u16 = 33434;

/// Probe payload. Content is irrelevant, the datagram only has to expire.
const PROBE_PAYLOAD: &[u8] = b" ";

/// The send seam of a trace round.
pub trait ProbeSender {
    /// Emit one probe that expires after `hop_limit` forwarding nodes and
    /// return the transmission timestamp.
    fn send(&self, hop_limit: u8) -> io::Result<Instant>;
}

/// Sends UDP probes toward the trace destination.
pub struct UdpSender {
    target: SocketAddrV4,
}

impl UdpSender {
    pub fn new(target: Ipv4Addr) -> UdpSender {
        UdpSender {
            target: SocketAddrV4::new(target, PROBE_PORT),
        }
    }
}

impl ProbeSender for UdpSender {
    fn send(&self, hop_limit: u8) -> io::Result<Instant> {
        debug_assert!(hop_limit >= 1);
        // one socket per probe, dropped on every exit path
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.set_ttl(u32::from(hop_limit))?;
        let sent_at = Instant::now();
        socket.send_to(PROBE_PAYLOAD, self.target)?;
        debug!(hop_limit, target = %self.target, "probe sent");
        Ok(sent_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_send_needs_no_privilege() {
        let sender = UdpSender::new(Ipv4Addr::LOCALHOST);
        let before = Instant::now();
        let sent_at = sender.send(1).unwrap();
        assert!(sent_at >= before);
    }
}
