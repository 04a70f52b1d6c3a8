//! Error types for termstatus.
//!
//! Every failure a caller can observe is a `TermError`. Device and clearer
//! failures are reported to the caller whose request triggered them; the
//! engine itself keeps running.

use std::io;

use thiserror::Error;

/// Top-level error type for termstatus.
#[derive(Debug, Error)]
pub enum TermError {
    /// Writing to or flushing the output device failed.
    #[error("Device write failed: {0}")]
    Io(#[from] io::Error),

    /// Erasing the previously drawn status lines failed.
    #[error("Failed to clear {lines} status line(s): {source}")]
    Clear {
        /// Number of lines above the cursor the clearer was asked to erase.
        lines: usize,
        /// Underlying clearer failure.
        #[source]
        source: io::Error,
    },

    /// The cancellation token fired before the request was processed.
    #[error("Terminal output was cancelled")]
    Cancelled,

    /// The engine thread is no longer running.
    #[error("Terminal engine disconnected")]
    Disconnected,

    /// A request was issued from the engine thread itself.
    #[error("Reentrant call from the terminal engine thread")]
    Reentrant,

    /// The engine thread could not be spawned.
    #[error("Failed to spawn terminal engine: {0}")]
    Spawn(#[source] io::Error),
}

impl TermError {
    /// Creates a clearer error.
    #[must_use]
    pub fn clear(lines: usize, source: io::Error) -> Self {
        Self::Clear { lines, source }
    }

    /// Returns true if this is a device I/O error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Returns true if this is a clearer error.
    #[must_use]
    pub const fn is_clear(&self) -> bool {
        matches!(self, Self::Clear { .. })
    }

    /// Returns true if the request was rejected because of cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if the engine stopped and can no longer serve requests.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Disconnected | Self::Spawn(_))
    }
}

impl From<TermError> for io::Error {
    fn from(err: TermError) -> Self {
        match err {
            TermError::Io(e) => e,
            TermError::Clear { source, .. } => source,
            TermError::Cancelled | TermError::Disconnected => {
                Self::new(io::ErrorKind::BrokenPipe, err)
            }
            TermError::Reentrant => Self::new(io::ErrorKind::WouldBlock, err),
            TermError::Spawn(e) => e,
        }
    }
}

/// Result type alias for termstatus operations.
pub type TermResult<T> = Result<T, TermError>;
