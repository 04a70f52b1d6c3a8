//! Status region bookkeeping.
//!
//! The engine remembers the last status it drew and how many terminal lines
//! that status occupies. The line count is the erase debt: the number of lines
//! that must be cleared before anything else is written.

/// Strips every trailing `\n` from `buf`.
#[must_use]
pub fn strip_trailing_newlines(buf: &[u8]) -> &[u8] {
    let end = buf.iter().rposition(|&b| b != b'\n').map_or(0, |idx| idx + 1);
    &buf[..end]
}

/// Counts the terminal lines `buf` occupies once drawn.
///
/// Trailing newlines do not open an extra line, so
/// `count_lines(p) == count_lines(strip_trailing_newlines(p))`. Interior empty
/// lines still take up a row and are counted.
#[must_use]
pub fn count_lines(buf: &[u8]) -> usize {
    let stripped = strip_trailing_newlines(buf);
    if stripped.is_empty() {
        return 0;
    }
    stripped.iter().filter(|&&b| b == b'\n').count() + 1
}

/// The status text currently drawn on the device and its erase debt.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusBuffer {
    buf: Vec<u8>,
    lines: usize,
}

impl StatusBuffer {
    /// Creates an empty status buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            lines: 0,
        }
    }

    /// The status text as it was drawn, without trailing newlines.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of lines that must be erased before the next write.
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.lines
    }

    /// Returns true if no status is drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Records `stripped` as the status now on screen.
    ///
    /// `stripped` must already have its trailing newlines removed.
    pub fn replace(&mut self, stripped: &[u8]) {
        debug_assert_eq!(stripped, strip_trailing_newlines(stripped));
        self.buf.clear();
        self.buf.extend_from_slice(stripped);
        self.lines = count_lines(stripped);
    }

    /// Forgets the drawn status.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.lines = 0;
    }
}
