//! Detector Console
//!
//! Drives the detector machine from stdin and prints every state change.
//!
//! Key concepts:
//! - Producers on any thread, transitions on the machine's worker
//! - Timers that feed expiry messages back into the queue
//! - Stale timeouts silently dropped once the machine has moved on
//!
//! Commands: start, connect, disconnect, signal <n>, abort, state, quit
//!
//! Run with: cargo run --example detector_console
//! Set RUST_LOG=stateloop=debug to watch the dispatch worker.

use stateloop::detector::{Detector, DetectorMessage, DetectorSettings, ThreadTimer};
use stateloop::{MachineConfig, State};
use std::io::{self, BufRead, Write};
use std::thread;
use tracing_subscriber::EnvFilter;

fn parse(line: &str) -> Result<Option<DetectorMessage>, String> {
    let mut words = line.split_whitespace();
    let message = match words.next() {
        Some("start") => DetectorMessage::Start,
        Some("connect") => DetectorMessage::Connected,
        Some("disconnect") => DetectorMessage::Disconnected,
        Some("abort") => DetectorMessage::Abort,
        Some("signal") => {
            let strength = words
                .next()
                .ok_or("usage: signal <0-255>")?
                .parse::<u8>()
                .map_err(|err| format!("bad signal strength: {err}"))?;
            DetectorMessage::Signal(strength)
        }
        Some(other) => return Err(format!("unknown command '{other}'")),
        None => return Ok(None),
    };
    Ok(Some(message))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stateloop=info")),
        )
        .with_writer(io::stderr)
        .init();

    println!("=== Detector Console ===\n");

    let settings = DetectorSettings {
        connection_timeout_ms: 8_000,
        search_timeout_ms: 15_000,
        ..DetectorSettings::default()
    };
    println!(
        "Connection timeout: {:?}, search timeout: {:?}, signal threshold: {}\n",
        settings.connection_timeout(),
        settings.search_timeout(),
        settings.signal_threshold
    );

    let detector = Detector::new(MachineConfig::new("detector"), settings, ThreadTimer::new)?;
    let mut changes = detector.machine().subscribe();
    let printer = thread::spawn(move || {
        while let Some(change) = changes.blocking_recv() {
            let marker = if change.to.is_final() { " (final)" } else { "" };
            println!("  {:?} -> {:?}{}", change.from, change.to, marker);
        }
    });

    detector.start()?;
    println!("Commands: start, connect, disconnect, signal <n>, abort, state, quit\n");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            "quit" | "exit" => break,
            "state" => println!("  current: {:?}", detector.machine().current_state()),
            command => match parse(command) {
                Ok(Some(message)) => detector.machine().handle_message(message),
                Ok(None) => {}
                Err(err) => println!("  {err}"),
            },
        }
        io::stdout().flush()?;
    }

    detector.machine().dispose();
    detector.machine().join()?;
    drop(detector);
    let _ = printer.join();

    println!("\n=== Console Closed ===");
    Ok(())
}
