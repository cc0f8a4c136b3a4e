use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::transport::TransportChannelType::Layer4;
use pnet::transport::TransportProtocol::Ipv4;
use pnet::transport::{icmp_packet_iter, transport_channel};
use tracing::debug;

use crate::dns_resolver;

/// One inbound control message: who answered, their display name and when
/// the message arrived.
pub struct Reply {
    pub addr: Ipv4Addr,
    pub hostname: String,
    pub at: Instant,
}

/// The receive seam of a trace round.
pub trait ReplyListener {
    /// Wait up to `timeout` for an inbound control message. `Ok(None)`
    /// means the window elapsed without a reply, a routine outcome.
    fn recv(&self, timeout: Duration) -> io::Result<Option<Reply>>;
}

/// Receives ICMP notifications on a raw transport channel.
///
/// Opening the channel needs raw-socket privileges; that precondition is
/// checked once at startup, not per round.
pub struct IcmpListener;

impl ReplyListener for IcmpListener {
    fn recv(&self, timeout: Duration) -> io::Result<Option<Reply>> {
        // one channel per round, dropped on every exit path
        let (_, mut rx) = transport_channel(1024, Layer4(Ipv4(IpNextHeaderProtocols::Icmp)))?;
        let mut iter = icmp_packet_iter(&mut rx);
        match iter.next_with_timeout(timeout)? {
            Some((packet, addr)) => {
                let at = Instant::now();
                debug!(
                    source = %addr,
                    icmp_type = packet.get_icmp_type().0,
                    icmp_code = packet.get_icmp_code().0,
                    "control message received"
                );
                let IpAddr::V4(addr) = addr else {
                    // a Layer4/Ipv4 channel only yields IPv4 sources
                    return Ok(None);
                };
                let hostname = dns_resolver::reverse_lookup(addr);
                Ok(Some(Reply { addr, hostname, at }))
            }
            None => {
                debug!("receive window elapsed without a reply");
                Ok(None)
            }
        }
    }
}
