//! # termstatus - status lines that stay put
//!
//! termstatus serializes output from many threads onto one terminal while
//! keeping an ephemeral status region (progress lines, spinners, clocks) at
//! the bottom of the output. Permanent messages scroll above it; the status is
//! erased and redrawn in place instead of piling up.
//!
//! ## Core Concepts
//!
//! - **Term**: the concurrency-safe handle; `write` and `set_status` block
//!   until a single engine thread has processed the request
//! - **Engine**: the only owner of the output device, tracking the drawn
//!   status and how many lines it occupies
//! - **LineClearer**: the platform strategy that erases previously drawn lines
//! - **Terminal**: an output device that knows whether it is interactive;
//!   redirected output gets plain passthrough with status updates dropped
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::io::Write;
//!
//! use termstatus::{CancellationToken, Term};
//!
//! let cancel = CancellationToken::new();
//! let term = Term::new(cancel.clone(), std::io::stdout())?;
//!
//! term.set_status(b"downloading: 42%")?;
//! writeln!(&term, "fetched index")?;
//!
//! cancel.cancel();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cancel;
pub mod clear;
pub mod engine;
pub mod error;
pub mod progress;
pub mod status;
pub mod term;
pub mod terminal;
pub mod testing;

pub use cancel::CancellationToken;
pub use clear::{AnsiClearer, LineClearer};
pub use engine::Mode;
pub use error::{TermError, TermResult};
pub use progress::{ProgressReader, StatusSink};
pub use status::{count_lines, strip_trailing_newlines};
pub use term::{ModeSelection, Term, TermBuilder, TermConfig};
pub use terminal::Terminal;
