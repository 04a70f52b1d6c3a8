//! In-memory devices for tests and embedding.
//!
//! [`MemoryTerminal`] records every byte the engine writes and can be told to
//! fail. [`RecordingClearer`] writes a visible `<clear:N>` marker instead of
//! escape sequences, so a test can read the exact erase/draw sequence straight
//! from the device contents.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clear::LineClearer;
use crate::terminal::Terminal;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A shared in-memory output device.
///
/// Clones share the same buffer, so a test can keep one clone while the engine
/// owns another.
#[derive(Debug, Clone)]
pub struct MemoryTerminal {
    buf: Arc<Mutex<Vec<u8>>>,
    interactive: bool,
    // Writes left before the device starts failing; `usize::MAX` never fails.
    write_budget: Arc<AtomicUsize>,
}

impl Default for MemoryTerminal {
    fn default() -> Self {
        Self {
            buf: Arc::default(),
            interactive: false,
            write_budget: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }
}

impl MemoryTerminal {
    /// A device that reports itself as an interactive terminal.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    /// A device that behaves like output redirected to a file or pipe.
    #[must_use]
    pub fn redirected() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        let budget = if failing { 0 } else { usize::MAX };
        self.write_budget.store(budget, Ordering::SeqCst);
    }

    /// Lets `writes` more write calls succeed, then fails every later one.
    pub fn fail_after(&self, writes: usize) {
        self.write_budget.store(writes, Ordering::SeqCst);
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        lock(&self.buf).clone()
    }

    /// Everything written so far, decoded lossily.
    #[must_use]
    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&lock(&self.buf)).into_owned()
    }

    /// Discards the recorded output.
    pub fn reset(&self) {
        lock(&self.buf).clear();
    }
}

impl Write for MemoryTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let spent = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            });
        if spent.is_err() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "memory terminal is failing"));
        }
        lock(&self.buf).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Terminal for MemoryTerminal {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn line_clearer(&self) -> Box<dyn LineClearer> {
        Box::new(RecordingClearer::new())
    }
}

/// A clearer that records requests and writes `<clear:N>` markers.
#[derive(Debug, Clone, Default)]
pub struct RecordingClearer {
    calls: Arc<Mutex<Vec<usize>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingClearer {
    /// Creates a clearer with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `n` argument of every successful call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<usize> {
        lock(&self.calls).clone()
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl LineClearer for RecordingClearer {
    fn clear_lines(&mut self, device: &mut dyn Write, n: usize) -> io::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::other("recording clearer is failing"));
        }
        device.write_all(format!("<clear:{n}>").as_bytes())?;
        lock(&self.calls).push(n);
        Ok(())
    }
}
