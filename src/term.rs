//! The public handle.
//!
//! `Term` is the concurrency-safe facade over the engine thread. Every call
//! allocates a fresh one-shot reply channel, submits a message, and blocks
//! until the engine answers. Handing the message over races against the
//! cancellation token, so a caller waiting for a busy engine is released once
//! output has been cancelled. A message the engine has taken is always answered
//! with its real result, so a reported `Cancelled` means nothing was written.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{bounded, select, Sender};

use crate::cancel::CancellationToken;
use crate::clear::LineClearer;
use crate::engine::{Engine, Message, Mode};
use crate::error::{TermError, TermResult};
use crate::terminal::Terminal;

/// How the run mode is chosen at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ModeSelection {
    /// Ask the device whether it is interactive.
    #[default]
    Auto,
    /// Always redraw the status in place.
    Interactive,
    /// Always forward writes verbatim and drop status updates.
    Passthrough,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct TermConfig {
    /// Run mode selection.
    pub mode: ModeSelection,
    /// Messages that may queue ahead of the engine. Zero means every
    /// submission hands its message directly to the engine.
    pub queue_capacity: usize,
    /// Name of the engine thread.
    pub thread_name: String,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            mode: ModeSelection::Auto,
            queue_capacity: 0,
            thread_name: "termstatus".to_string(),
        }
    }
}

/// Builder for [`Term`].
pub struct TermBuilder<D> {
    device: D,
    config: TermConfig,
    clearer: Option<Box<dyn LineClearer>>,
    cancel: Option<CancellationToken>,
}

impl<D: Terminal> TermBuilder<D> {
    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: TermConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the device capability check.
    #[must_use]
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.config.mode = if interactive {
            ModeSelection::Interactive
        } else {
            ModeSelection::Passthrough
        };
        self
    }

    /// Uses `clearer` instead of the device's default clearer.
    #[must_use]
    pub fn clearer(mut self, clearer: impl LineClearer + 'static) -> Self {
        self.clearer = Some(Box::new(clearer));
        self
    }

    /// Stops the engine when `cancel` fires.
    #[must_use]
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Starts the engine thread and returns the handle.
    pub fn spawn(self) -> TermResult<Term> {
        let Self {
            device,
            config,
            clearer,
            cancel,
        } = self;

        let mode = match config.mode {
            ModeSelection::Auto => Mode::for_capability(device.is_interactive()),
            ModeSelection::Interactive => Mode::Interactive,
            ModeSelection::Passthrough => Mode::Passthrough,
        };
        let clearer = clearer.unwrap_or_else(|| device.line_clearer());
        let cancel = cancel.unwrap_or_default();

        let (tx, rx) = bounded::<Message>(config.queue_capacity);
        let engine = Engine::new(device, clearer, mode);
        let engine_cancel = cancel.clone();
        let join = thread::Builder::new()
            .name(config.thread_name)
            .spawn(move || engine.run(&rx, &engine_cancel))
            .map_err(TermError::Spawn)?;

        Ok(Term {
            tx,
            cancel,
            mode,
            engine_thread: join.thread().id(),
            join: Mutex::new(Some(join)),
        })
    }
}

/// Concurrency-safe handle to a status-aware terminal writer.
///
/// Share it between threads with `&Term` or `Arc<Term>`. Dropping the handle
/// erases the status region and joins the engine thread.
#[derive(Debug)]
pub struct Term {
    tx: Sender<Message>,
    cancel: CancellationToken,
    mode: Mode,
    engine_thread: ThreadId,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Term {
    /// Starts an engine on `device` that stops when `cancel` fires.
    pub fn new<D: Terminal>(cancel: CancellationToken, device: D) -> TermResult<Self> {
        Self::builder(device).cancellation(cancel).spawn()
    }

    /// Returns a builder for a terminal writing to `device`.
    pub fn builder<D: Terminal>(device: D) -> TermBuilder<D> {
        TermBuilder {
            device,
            config: TermConfig::default(),
            clearer: None,
            cancel: None,
        }
    }

    /// The mode chosen at construction.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns true if status updates are drawn.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.mode == Mode::Interactive
    }

    /// The token that stops this terminal.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Writes `payload` above the status region.
    ///
    /// Blocks until the engine wrote it and returns the number of payload
    /// bytes written.
    pub fn write(&self, payload: &[u8]) -> TermResult<usize> {
        self.submit(|reply| Message::Write {
            payload: payload.to_vec(),
            reply,
        })
    }

    /// Replaces the status region with `status`.
    ///
    /// Trailing newlines are ignored. In passthrough mode this is a no-op.
    pub fn set_status(&self, status: &[u8]) -> TermResult<()> {
        self.submit(|reply| Message::SetStatus {
            payload: status.to_vec(),
            reply,
        })
    }

    fn submit<T>(&self, make: impl FnOnce(Sender<TermResult<T>>) -> Message) -> TermResult<T> {
        if thread::current().id() == self.engine_thread {
            return Err(TermError::Reentrant);
        }
        if self.cancel.is_cancelled() {
            return Err(TermError::Cancelled);
        }

        let (reply_tx, reply_rx) = bounded::<TermResult<T>>(1);
        let msg = make(reply_tx);

        select! {
            send(self.tx, msg) -> res => res.map_err(|_| TermError::Disconnected)?,
            recv(self.cancel.receiver()) -> _ => return Err(TermError::Cancelled),
        }

        reply_rx.recv().map_err(|_| TermError::Disconnected)?
    }
}

impl Write for &Term {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Term::write(*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        // The engine flushes the device after every message.
        Ok(())
    }

    // One message per formatted write, so the status is not redrawn between
    // the pieces of a single `write!`.
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        match args.as_str() {
            Some(s) => self.write_all(s.as_bytes()),
            None => self.write_all(fmt::format(args).as_bytes()),
        }
    }
}

impl Write for Term {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        <&Term as Write>::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        <&Term as Write>::write_fmt(&mut &*self, args)
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        // Close the channel so the engine erases the status and exits, then join.
        let (dummy_tx, _) = bounded::<Message>(0);
        let old_tx = std::mem::replace(&mut self.tx, dummy_tx);
        drop(old_tx);

        let handle = match self.join.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}
