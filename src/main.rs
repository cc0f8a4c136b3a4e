use std::io;
use std::process;

use clap::Parser;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{ExecutableCommand, cursor};
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::listener::IcmpListener;
use crate::report::ConsoleReporter;
use crate::sender::UdpSender;
use crate::tracer::Tracer;

mod dns_resolver;
mod error;
mod listener;
mod privilege;
mod report;
mod sender;
mod tracer;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Destination hostname or IPv4 address
    host: String,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    // fatal before any network activity
    privilege::ensure_raw_socket_privilege()?;

    ctrlc::set_handler(|| process::exit(130)).expect("failed to set Ctrl-C handler");

    clear_screen()?;

    let target = dns_resolver::resolve(&args.host)?;
    let mut tracer = Tracer::new(target, UdpSender::new(target), IcmpListener, ConsoleReporter);
    tracer.run();
    Ok(())
}

fn clear_screen() -> io::Result<()> {
    io::stdout()
        .execute(Clear(ClearType::All))?
        .execute(cursor::MoveTo(0, 0))?;
    Ok(())
}
