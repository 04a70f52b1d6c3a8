//! termstatus demo
//!
//! One thread prints numbered messages while the main thread keeps a
//! multi-line clock in the status region. Stops after `--seconds` seconds.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

use termstatus::{CancellationToken, Term};

/// Demo configuration
struct Config {
    /// How long to run
    run_for: Duration,
    /// Delay between two messages
    message_every: Duration,
    /// Delay between two status refreshes
    status_every: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_for: Duration::from_secs(5),
            message_every: Duration::from_millis(800),
            status_every: Duration::from_millis(400),
        }
    }
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seconds" | "-s" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("error: --seconds requires a value");
                    std::process::exit(1);
                };
                let secs: u64 = value.parse().unwrap_or_else(|_| {
                    eprintln!("error: invalid number of seconds: {value}");
                    std::process::exit(1);
                });
                config.run_for = Duration::from_secs(secs);
                i += 2;
            }
            "--help" | "-h" => {
                println!("termstatus-demo - status lines below scrolling output");
                println!();
                println!("USAGE:");
                println!("    termstatus-demo [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -s, --seconds <N>    Run for N seconds [default: 5]");
                println!("    -h, --help           Print help");
                std::process::exit(0);
            }
            other => {
                eprintln!("error: unknown argument: {other}");
                std::process::exit(1);
            }
        }
    }

    config
}

fn status_text(started: Instant, tick: u64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let mut status = format!(
        "current time: {now} (unix)\nrunning for {:.1}s\n",
        started.elapsed().as_secs_f64()
    );
    // Vary the height so shrinking and growing both get exercised.
    if tick % 2 == 0 {
        status.push_str("another line\n");
    }
    if tick % 3 == 0 {
        status.push_str("another line foo\n");
    }
    status
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args();

    let cancel = CancellationToken::new();
    let term = Arc::new(Term::new(cancel.clone(), std::io::stdout())?);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::clone(&term))
        .without_time()
        .init();

    {
        let cancel = cancel.clone();
        let run_for = config.run_for;
        thread::spawn(move || {
            thread::sleep(run_for);
            cancel.cancel();
        });
    }

    let writer = {
        let term = Arc::clone(&term);
        let cancel = cancel.clone();
        let every = config.message_every;
        thread::spawn(move || {
            let mut i = 1u64;
            while !cancel.is_cancelled() {
                tracing::info!(message_no = i, "message {i}");
                thread::sleep(every);
                i += 1;
            }
        })
    };

    let started = Instant::now();
    let mut tick = 0u64;
    while !cancel.is_cancelled() {
        match term.set_status(status_text(started, tick).as_bytes()) {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => break,
            Err(err) => return Err(err.into()),
        }
        thread::sleep(config.status_every);
        tick += 1;
    }

    let _ = writer.join();
    Ok(())
}
