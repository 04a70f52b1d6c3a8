//! progress-cat
//!
//! Copies stdin to stdout and shows how much went through on stderr.

use std::io;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use termstatus::{CancellationToken, ProgressReader, Term};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let term = Arc::new(Term::new(cancel.clone(), io::stderr())?);

    // Log lines share stderr with the progress line, so they go through the
    // engine and land above it.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(Arc::clone(&term))
        .init();

    let stdin = io::stdin().lock();
    let mut reader = ProgressReader::new(stdin, Arc::clone(&term));
    let copied = io::copy(&mut reader, &mut io::stdout().lock())?;
    tracing::debug!(bytes = copied, "copy finished");

    // Erases the progress line before exiting.
    cancel.cancel();
    Ok(())
}
