use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::listener::{Reply, ReplyListener};
use crate::report::Reporter;
use crate::sender::ProbeSender;

/// Highest hop limit probed before the trace gives up.
pub const MAX_HOPS: u8 = 30;

/// How long each round waits for a control message.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of one round, handed to the reporting collaborator as-is.
///
/// A timed-out round carries the hop limit and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopResult {
    pub hop: u8,
    pub hostname: Option<String>,
    pub addr: Option<Ipv4Addr>,
    pub rtt: Option<Duration>,
}

impl HopResult {
    fn timed_out(hop: u8) -> HopResult {
        HopResult {
            hop,
            hostname: None,
            addr: None,
            rtt: None,
        }
    }

    fn replied(hop: u8, sent_at: Instant, reply: Reply) -> HopResult {
        HopResult {
            hop,
            hostname: Some(reply.hostname),
            addr: Some(reply.addr),
            rtt: Some(reply.at.saturating_duration_since(sent_at)),
        }
    }
}

enum State {
    Running(u8),
    Done,
}

/// Drives one trace session: one round per hop limit starting at 1, one
/// `HopResult` streamed per round, until the destination answers or the
/// hop cap is reached.
pub struct Tracer<S, L, R> {
    target: Ipv4Addr,
    sender: S,
    listener: L,
    reporter: R,
}

impl<S: ProbeSender, L: ReplyListener, R: Reporter> Tracer<S, L, R> {
    pub fn new(target: Ipv4Addr, sender: S, listener: L, reporter: R) -> Tracer<S, L, R> {
        Tracer {
            target,
            sender,
            listener,
            reporter,
        }
    }

    pub fn run(&mut self) {
        let mut state = State::Running(1);
        while let State::Running(hop) = state {
            let result = self.round(hop);
            self.reporter.on_hop(&result);
            state = Self::next_state(hop, result.addr, self.target);
        }
    }

    /// One round: send a probe at `hop`, then listen for the notification.
    /// A send or receive fault only costs this round, which is recorded as
    /// a timeout; the session continues.
    fn round(&mut self, hop: u8) -> HopResult {
        let sent_at = match self.sender.send(hop) {
            Ok(sent_at) => sent_at,
            Err(e) => {
                warn!(hop, error = %e, "probe send failed, recording timeout");
                return HopResult::timed_out(hop);
            }
        };
        match self.listener.recv(RECV_TIMEOUT) {
            Ok(Some(reply)) => HopResult::replied(hop, sent_at, reply),
            Ok(None) => HopResult::timed_out(hop),
            Err(e) => {
                warn!(hop, error = %e, "receive failed, recording timeout");
                HopResult::timed_out(hop)
            }
        }
    }

    fn next_state(hop: u8, responder: Option<Ipv4Addr>, target: Ipv4Addr) -> State {
        if responder == Some(target) {
            debug!(hop, "destination reached");
            State::Done
        } else if hop >= MAX_HOPS {
            debug!(hop, "hop cap reached");
            State::Done
        } else {
            State::Running(hop + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io;

    use super::*;

    const TARGET: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);
    const ROUTER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

    struct ScriptedSender {
        base: Instant,
        sent: RefCell<Vec<u8>>,
        fail_on: Option<u8>,
    }

    impl ScriptedSender {
        fn new(base: Instant) -> ScriptedSender {
            ScriptedSender {
                base,
                sent: RefCell::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    impl ProbeSender for ScriptedSender {
        fn send(&self, hop_limit: u8) -> io::Result<Instant> {
            self.sent.borrow_mut().push(hop_limit);
            if self.fail_on == Some(hop_limit) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "sendto"));
            }
            Ok(self.base)
        }
    }

    struct ScriptedListener {
        replies: RefCell<VecDeque<Option<Reply>>>,
        recv_calls: Cell<u32>,
    }

    impl ScriptedListener {
        fn new(replies: Vec<Option<Reply>>) -> ScriptedListener {
            ScriptedListener {
                replies: RefCell::new(replies.into()),
                recv_calls: Cell::new(0),
            }
        }
    }

    impl ReplyListener for ScriptedListener {
        fn recv(&self, _timeout: Duration) -> io::Result<Option<Reply>> {
            self.recv_calls.set(self.recv_calls.get() + 1);
            Ok(self.replies.borrow_mut().pop_front().unwrap_or(None))
        }
    }

    #[derive(Default)]
    struct CollectingReporter {
        hops: Vec<HopResult>,
    }

    impl Reporter for CollectingReporter {
        fn on_hop(&mut self, hop: &HopResult) {
            self.hops.push(hop.clone());
        }
    }

    fn reply(addr: Ipv4Addr, base: Instant, rtt: Duration) -> Option<Reply> {
        Some(Reply {
            addr,
            hostname: addr.to_string(),
            at: base + rtt,
        })
    }

    #[test]
    fn stops_when_destination_replies() {
        let base = Instant::now();
        let rtt = Duration::from_micros(1200);
        let listener = ScriptedListener::new(vec![
            reply(ROUTER, base, rtt),
            None,
            reply(TARGET, base, rtt),
        ]);
        let mut tracer = Tracer::new(
            TARGET,
            ScriptedSender::new(base),
            listener,
            CollectingReporter::default(),
        );
        tracer.run();

        let hops = &tracer.reporter.hops;
        assert_eq!(hops.len(), 3);
        assert_eq!(hops[0].addr, Some(ROUTER));
        assert_eq!(hops[1], HopResult::timed_out(2));
        assert_eq!(hops[2].addr, Some(TARGET));
        // one probe and one receive attempt per hop, no round after the
        // destination answered
        assert_eq!(*tracer.sender.sent.borrow(), vec![1, 2, 3]);
        assert_eq!(tracer.listener.recv_calls.get(), 3);
    }

    #[test]
    fn runs_thirty_rounds_when_nothing_replies() {
        let base = Instant::now();
        let mut tracer = Tracer::new(
            TARGET,
            ScriptedSender::new(base),
            ScriptedListener::new(Vec::new()),
            CollectingReporter::default(),
        );
        tracer.run();

        let hops = &tracer.reporter.hops;
        assert_eq!(hops.len(), usize::from(MAX_HOPS));
        assert!(hops.iter().all(|h| h.rtt.is_none() && h.addr.is_none()));
        let expected: Vec<u8> = (1..=MAX_HOPS).collect();
        assert_eq!(*tracer.sender.sent.borrow(), expected);
        assert_eq!(tracer.listener.recv_calls.get(), u32::from(MAX_HOPS));
    }

    #[test]
    fn send_fault_costs_only_that_round() {
        let base = Instant::now();
        let rtt = Duration::from_millis(5);
        let listener =
            ScriptedListener::new(vec![reply(ROUTER, base, rtt), reply(TARGET, base, rtt)]);
        let mut sender = ScriptedSender::new(base);
        sender.fail_on = Some(2);
        let mut tracer = Tracer::new(TARGET, sender, listener, CollectingReporter::default());
        tracer.run();

        let hops = &tracer.reporter.hops;
        assert_eq!(hops.len(), 3);
        assert_eq!(hops[1], HopResult::timed_out(2));
        assert_eq!(hops[2].addr, Some(TARGET));
        // the failed round never opened the receive channel
        assert_eq!(tracer.listener.recv_calls.get(), 2);
    }

    #[test]
    fn rtt_comes_from_the_same_round() {
        let base = Instant::now();
        let rtt = Duration::from_micros(1200);
        let listener = ScriptedListener::new(vec![reply(TARGET, base, rtt)]);
        let mut tracer = Tracer::new(
            TARGET,
            ScriptedSender::new(base),
            listener,
            CollectingReporter::default(),
        );
        tracer.run();

        assert_eq!(tracer.reporter.hops[0].rtt, Some(rtt));
    }

    #[test]
    fn rtt_never_goes_negative() {
        let base = Instant::now();
        let listener = ScriptedListener::new(vec![reply(TARGET, base, Duration::ZERO)]);
        let mut tracer = Tracer::new(
            TARGET,
            ScriptedSender::new(base),
            listener,
            CollectingReporter::default(),
        );
        tracer.run();

        assert_eq!(tracer.reporter.hops[0].rtt, Some(Duration::ZERO));
    }
}
