//! The serialization engine.
//!
//! One thread owns the output device. Every write and status update arrives
//! as a [`Message`] and is processed to completion before the next one is
//! looked at, so output from concurrent callers never interleaves mid-payload.
//!
//! In interactive mode the engine keeps the status region at the bottom of the
//! output: before anything is written the previously drawn status is erased,
//! and after a regular write it is drawn again below the new output.

mod message;

use std::io::Write;

use crossbeam_channel::{select, Receiver};

use crate::cancel::CancellationToken;
use crate::clear::LineClearer;
use crate::error::{TermError, TermResult};
use crate::status::{strip_trailing_newlines, StatusBuffer};

pub(crate) use message::Message;

/// How the engine treats the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Status lines are drawn and redrawn in place.
    Interactive,
    /// Writes are forwarded verbatim; status updates are dropped.
    Passthrough,
}

impl Mode {
    /// Returns the mode for a device with the given capability.
    #[must_use]
    pub const fn for_capability(interactive: bool) -> Self {
        if interactive {
            Self::Interactive
        } else {
            Self::Passthrough
        }
    }
}

/// Sole owner of the device and the status bookkeeping.
pub(crate) struct Engine<D> {
    device: D,
    clearer: Box<dyn LineClearer>,
    status: StatusBuffer,
    mode: Mode,
}

impl<D: Write> Engine<D> {
    pub(crate) fn new(device: D, clearer: Box<dyn LineClearer>, mode: Mode) -> Self {
        Self {
            device,
            clearer,
            status: StatusBuffer::new(),
            mode,
        }
    }

    /// Processes messages until cancellation or until every sender is gone.
    ///
    /// Every message taken off `rx` gets an answer: its result, or
    /// [`TermError::Cancelled`] if the token fired before it was processed.
    pub(crate) fn run(mut self, rx: &Receiver<Message>, cancel: &CancellationToken) {
        tracing::debug!(mode = ?self.mode, "status engine started");

        loop {
            select! {
                recv(cancel.receiver()) -> _ => break,
                recv(rx) -> msg => match msg {
                    Ok(msg) if cancel.is_cancelled() => {
                        msg.reject(TermError::Cancelled);
                        break;
                    }
                    Ok(msg) => self.dispatch(msg),
                    Err(_) => break,
                },
            }
        }

        // Messages still queued behind a buffered channel.
        for msg in rx.try_iter() {
            msg.reject(TermError::Cancelled);
        }

        self.shutdown();
    }

    fn dispatch(&mut self, msg: Message) {
        match msg {
            Message::Write { payload, reply } => {
                let result = match self.mode {
                    Mode::Interactive => self.write(&payload),
                    Mode::Passthrough => self.passthrough(&payload),
                };
                if let Err(err) = &result {
                    tracing::warn!(error = %err, "terminal write failed");
                }
                let _ = reply.send(result);
            }
            Message::SetStatus { payload, reply } => {
                let result = match self.mode {
                    Mode::Interactive => self.set_status(&payload),
                    Mode::Passthrough => Ok(()),
                };
                if let Err(err) = &result {
                    tracing::warn!(error = %err, "status update failed");
                }
                let _ = reply.send(result);
            }
        }
    }

    fn passthrough(&mut self, payload: &[u8]) -> TermResult<usize> {
        self.device.write_all(payload)?;
        self.device.flush()?;
        Ok(payload.len())
    }

    /// Erase, write, redraw.
    fn write(&mut self, payload: &[u8]) -> TermResult<usize> {
        self.undo_status()?;
        self.device.write_all(payload)?;
        if !self.status.is_empty() {
            self.device.write_all(self.status.as_bytes())?;
        }
        self.device.flush()?;
        Ok(payload.len())
    }

    fn set_status(&mut self, payload: &[u8]) -> TermResult<()> {
        self.undo_status()?;
        let stripped = strip_trailing_newlines(payload);
        self.device.write_all(stripped)?;
        self.device.flush()?;
        self.status.replace(stripped);
        tracing::trace!(lines = self.status.lines(), "status drawn");
        Ok(())
    }

    /// Pays the erase debt of the currently drawn status.
    fn undo_status(&mut self) -> TermResult<()> {
        let lines = self.status.lines();
        if lines == 0 {
            return Ok(());
        }
        let above = lines - 1;
        self.clearer
            .clear_lines(&mut self.device, above)
            .map_err(|e| TermError::clear(above, e))
    }

    fn shutdown(&mut self) {
        if self.mode == Mode::Interactive {
            if let Err(err) = self.undo_status() {
                tracing::debug!(error = %err, "failed to erase status on shutdown");
            }
            self.status.clear();
        }
        let _ = self.device.flush();
        tracing::debug!("status engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    use crossbeam_channel::bounded;

    use crate::testing::{MemoryTerminal, RecordingClearer};

    fn engine(term: &MemoryTerminal, clearer: &RecordingClearer) -> Engine<MemoryTerminal> {
        Engine::new(term.clone(), Box::new(clearer.clone()), Mode::Interactive)
    }

    #[test]
    fn mode_follows_capability() {
        assert_eq!(Mode::for_capability(true), Mode::Interactive);
        assert_eq!(Mode::for_capability(false), Mode::Passthrough);
    }

    #[test]
    fn first_status_needs_no_erase() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.set_status(b"a\nb\n").unwrap();
        assert_eq!(term.contents_lossy(), "a\nb");
        assert!(clearer.calls().is_empty());
        assert_eq!(engine.status.lines(), 2);
    }

    #[test]
    fn status_replacement_erases_previous_lines() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.set_status(b"a\nb\n").unwrap();
        engine.set_status(b"x\n").unwrap();
        assert_eq!(term.contents_lossy(), "a\nb<clear:1>x");
        assert_eq!(clearer.calls(), vec![1]);
        assert_eq!(engine.status.lines(), 1);
        assert_eq!(engine.status.as_bytes(), b"x");
    }

    #[test]
    fn same_status_twice_is_one_cycle_each() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.set_status(b"working").unwrap();
        assert_eq!(engine.status.lines(), 1);
        engine.set_status(b"working").unwrap();
        assert_eq!(engine.status.lines(), 1);

        assert_eq!(term.contents_lossy(), "working<clear:0>working");
        assert_eq!(clearer.calls(), vec![0]);
    }

    #[test]
    fn write_redraws_status_below_payload() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.set_status(b"line1\n").unwrap();
        let n = engine.write(b"hello\n").unwrap();
        assert_eq!(n, 6);
        assert_eq!(term.contents_lossy(), "line1<clear:0>hello\nline1");
    }

    #[test]
    fn write_without_status_is_verbatim() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.write(b"one\n").unwrap();
        engine.write(b"two\n").unwrap();
        assert_eq!(term.contents_lossy(), "one\ntwo\n");
        assert!(clearer.calls().is_empty());
    }

    #[test]
    fn failed_write_keeps_bookkeeping() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.set_status(b"s1\ns2").unwrap();
        // The erase marker goes through, the payload does not.
        term.fail_after(1);
        let err = engine.write(b"lost\n").unwrap_err();
        assert!(err.is_io());
        assert_eq!(engine.status.lines(), 2);
        assert_eq!(engine.status.as_bytes(), b"s1\ns2");

        term.set_failing(false);
        engine.write(b"kept\n").unwrap();
        assert!(term.contents_lossy().ends_with("kept\ns1\ns2"));
    }

    #[test]
    fn failed_status_keeps_previous_status() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.set_status(b"old").unwrap();
        term.fail_after(1);
        assert!(engine.set_status(b"new\nstatus").unwrap_err().is_io());
        assert_eq!(engine.status.as_bytes(), b"old");
        assert_eq!(engine.status.lines(), 1);
    }

    #[test]
    fn clearer_failure_is_reported_and_skips_write() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.set_status(b"a\nb\nc").unwrap();
        clearer.set_failing(true);
        let err = engine.write(b"payload").unwrap_err();
        let TermError::Clear { lines, .. } = err else {
            panic!("expected Clear, got {err:?}");
        };
        assert_eq!(lines, 2);
        assert_eq!(term.contents_lossy(), "a\nb\nc");
    }

    #[test]
    fn shutdown_erases_status() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.set_status(b"s1\ns2\n").unwrap();
        engine.shutdown();
        assert_eq!(term.contents_lossy(), "s1\ns2<clear:1>");
        assert!(engine.status.is_empty());
    }

    #[test]
    fn shutdown_swallows_clearer_errors() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let mut engine = engine(&term, &clearer);

        engine.set_status(b"s").unwrap();
        clearer.set_failing(true);
        engine.shutdown();
        assert!(engine.status.is_empty());
    }

    #[test]
    fn passthrough_drops_status() {
        let term = MemoryTerminal::redirected();
        let clearer = RecordingClearer::new();
        let engine = Engine::new(term.clone(), Box::new(clearer.clone()), Mode::Passthrough);

        let (tx, rx) = bounded::<Message>(0);
        let cancel = CancellationToken::new();
        let worker = {
            let cancel = cancel.clone();
            thread::spawn(move || engine.run(&rx, &cancel))
        };

        let (reply, status_rx) = bounded(1);
        tx.send(Message::SetStatus {
            payload: b"progress".to_vec(),
            reply,
        })
        .unwrap();
        status_rx.recv().unwrap().unwrap();

        let (reply, write_rx) = bounded(1);
        tx.send(Message::Write {
            payload: b"log line\n".to_vec(),
            reply,
        })
        .unwrap();
        assert_eq!(write_rx.recv().unwrap().unwrap(), 9);

        drop(tx);
        worker.join().unwrap();
        assert_eq!(term.contents_lossy(), "log line\n");
        assert!(clearer.calls().is_empty());
    }

    #[test]
    fn run_stops_on_cancel_and_erases() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let engine = engine(&term, &clearer);

        let (tx, rx) = bounded::<Message>(0);
        let cancel = CancellationToken::new();
        let worker = {
            let cancel = cancel.clone();
            thread::spawn(move || engine.run(&rx, &cancel))
        };

        let (reply, ack) = bounded(1);
        tx.send(Message::SetStatus {
            payload: b"s1\ns2\n".to_vec(),
            reply,
        })
        .unwrap();
        ack.recv().unwrap().unwrap();

        cancel.cancel();
        worker.join().unwrap();
        assert_eq!(term.contents_lossy(), "s1\ns2<clear:1>");
        assert_eq!(clearer.calls(), vec![1]);
    }

    #[test]
    fn message_seen_after_cancel_is_rejected() {
        let term = MemoryTerminal::interactive();
        let clearer = RecordingClearer::new();
        let engine = engine(&term, &clearer);

        let (tx, rx) = bounded::<Message>(2);
        let (reply, write_rx) = bounded(1);
        tx.send(Message::Write {
            payload: b"late\n".to_vec(),
            reply,
        })
        .unwrap();
        let (reply, status_rx) = bounded(1);
        tx.send(Message::SetStatus {
            payload: b"late".to_vec(),
            reply,
        })
        .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        engine.run(&rx, &cancel);

        assert!(write_rx.recv().unwrap().unwrap_err().is_cancelled());
        assert!(status_rx.recv().unwrap().unwrap_err().is_cancelled());
        assert!(term.contents().is_empty());
        assert!(clearer.calls().is_empty());
    }
}
