//! Progress reporting for byte streams.
//!
//! [`ProgressReader`] wraps any reader and publishes how many bytes went
//! through it as a status line. Reports are throttled so a fast copy loop
//! does not flood the terminal with redraws.

use std::io::{self, Read};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::TermResult;
use crate::term::Term;

/// Default minimum time between two status reports.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Something that can display a status line.
pub trait StatusSink {
    /// Replaces the displayed status with `status`.
    fn set_status(&self, status: &[u8]) -> TermResult<()>;
}

impl StatusSink for Term {
    fn set_status(&self, status: &[u8]) -> TermResult<()> {
        Term::set_status(self, status)
    }
}

impl<S: StatusSink + ?Sized> StatusSink for &S {
    fn set_status(&self, status: &[u8]) -> TermResult<()> {
        (**self).set_status(status)
    }
}

impl<S: StatusSink + ?Sized> StatusSink for Arc<S> {
    fn set_status(&self, status: &[u8]) -> TermResult<()> {
        (**self).set_status(status)
    }
}

/// Formats a byte count with IEC units (`KiB`, `MiB`, ...).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// A reader that reports its throughput through a [`StatusSink`].
#[derive(Debug)]
pub struct ProgressReader<R, S> {
    inner: R,
    sink: S,
    bytes: u64,
    started: Instant,
    last_report: Option<Instant>,
    interval: Duration,
    finished: bool,
}

impl<R: Read, S: StatusSink> ProgressReader<R, S> {
    /// Wraps `inner`, reporting to `sink` at most every [`DEFAULT_REPORT_INTERVAL`].
    pub fn new(inner: R, sink: S) -> Self {
        Self::with_interval(inner, sink, DEFAULT_REPORT_INTERVAL)
    }

    /// Wraps `inner`, reporting to `sink` at most once per `interval`.
    pub fn with_interval(inner: R, sink: S, interval: Duration) -> Self {
        Self {
            inner,
            sink,
            bytes: 0,
            started: Instant::now(),
            last_report: None,
            interval,
            finished: false,
        }
    }

    /// Bytes read so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// Unwraps the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn status_line(&self, now: Instant) -> String {
        let elapsed = now.duration_since(self.started).as_secs_f64();
        let rate = if elapsed > 0.0 {
            (self.bytes as f64 / elapsed) as u64
        } else {
            0
        };
        format!(
            "{} read, {}/s, {:.1}s",
            format_bytes(self.bytes),
            format_bytes(rate),
            elapsed
        )
    }

    fn report(&mut self, now: Instant) {
        self.last_report = Some(now);
        let line = self.status_line(now);
        if let Err(err) = self.sink.set_status(line.as_bytes()) {
            tracing::debug!(error = %err, "dropping progress report");
        }
    }

    fn maybe_report(&mut self) {
        let now = Instant::now();
        let due = self
            .last_report
            .map_or(true, |last| now.duration_since(last) >= self.interval);
        if due {
            self.report(now);
        }
    }
}

impl<R: Read, S: StatusSink> Read for ProgressReader<R, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            if !self.finished && !buf.is_empty() {
                self.finished = true;
                self.report(Instant::now());
            }
            return Ok(0);
        }
        self.bytes += n as u64;
        self.maybe_report();
        Ok(n)
    }
}
