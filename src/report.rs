use std::time::Duration;

use crate::tracer::HopResult;

/// Consumes one result per round as the trace progresses.
pub trait Reporter {
    fn on_hop(&mut self, hop: &HopResult);
}

/// Prints one line per hop to standard output.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn on_hop(&mut self, hop: &HopResult) {
        println!("{}", format_hop(hop));
    }
}

/// Render one hop line: the hop index centered in a four-character
/// `*`-padded field, then the responder and round-trip time when known.
fn format_hop(hop: &HopResult) -> String {
    match (&hop.hostname, hop.addr, hop.rtt) {
        (Some(hostname), Some(addr), Some(rtt)) => {
            format!(
                "{:*^4} {}-({}) in {} ms",
                hop.hop,
                hostname,
                addr,
                format_millis(rtt)
            )
        }
        _ => format!("{:*^4} ", hop.hop),
    }
}

/// Milliseconds with three significant digits, trailing zeros trimmed.
fn format_millis(rtt: Duration) -> String {
    let ms = rtt.as_secs_f64() * 1_000.0;
    if ms <= 0.0 {
        return "0".to_string();
    }
    let precision = (2 - ms.log10().floor() as i32).max(0) as usize;
    let rendered = format!("{ms:.precision$}");
    if rendered.contains('.') {
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        rendered
    }
}
