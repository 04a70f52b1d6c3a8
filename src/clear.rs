//! Line clearing strategies.
//!
//! A `LineClearer` erases the current line and `n` lines above it, leaving the
//! cursor at the start of the topmost cleared line. Terminals that understand
//! escape sequences use [`AnsiClearer`]; legacy Windows consoles without VT
//! processing use the native screen-buffer API through `ConsoleClearer`.

use std::io::{self, Write};

/// Moves the cursor to column zero.
pub const CURSOR_HOME: &str = "\r";
/// Moves the cursor one line up.
pub const CURSOR_UP: &str = "\x1b[1A";
/// Clears the entire line under the cursor.
pub const CLEAR_LINE: &str = "\x1b[2K";

/// Erases previously drawn status lines on a device.
pub trait LineClearer: Send {
    /// Clears the current line and `n` lines above it.
    ///
    /// Afterwards the cursor is at the start of the topmost cleared line.
    fn clear_lines(&mut self, device: &mut dyn Write, n: usize) -> io::Result<()>;
}

impl<C: LineClearer + ?Sized> LineClearer for Box<C> {
    fn clear_lines(&mut self, device: &mut dyn Write, n: usize) -> io::Result<()> {
        (**self).clear_lines(device, n)
    }
}

/// Clears lines by writing ANSI escape sequences to the device.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnsiClearer;

impl LineClearer for AnsiClearer {
    fn clear_lines(&mut self, device: &mut dyn Write, n: usize) -> io::Result<()> {
        let mut seq = String::with_capacity(
            CURSOR_HOME.len() + CLEAR_LINE.len() + n * (CURSOR_HOME.len() + CURSOR_UP.len() + CLEAR_LINE.len()),
        );
        seq.push_str(CURSOR_HOME);
        seq.push_str(CLEAR_LINE);
        for _ in 0..n {
            seq.push_str(CURSOR_HOME);
            seq.push_str(CURSOR_UP);
            seq.push_str(CLEAR_LINE);
        }
        device.write_all(seq.as_bytes())
    }
}

#[cfg(windows)]
pub use self::windows::ConsoleClearer;

/// Picks the clearer for a Windows console handle.
///
/// Consoles that accept (or can be switched to) virtual terminal processing get
/// the ANSI clearer. Consoles that refuse it are driven through the native API.
/// Handles that are not consoles at all (mintty, pipes) fall back to ANSI.
#[cfg(windows)]
#[must_use]
pub fn console_clearer(handle: std::os::windows::io::RawHandle) -> Box<dyn LineClearer> {
    match windows::ConsoleClearer::detect(handle) {
        Some(clearer) => Box::new(clearer),
        None => Box::new(AnsiClearer),
    }
}

#[cfg(windows)]
mod windows {
    use std::io::{self, Write};
    use std::os::windows::io::RawHandle;

    use windows_sys::Win32::Foundation::HANDLE;
    use windows_sys::Win32::System::Console::{
        FillConsoleOutputCharacterW, GetConsoleMode, GetConsoleScreenBufferInfo, SetConsoleCursorPosition,
        SetConsoleMode, CONSOLE_SCREEN_BUFFER_INFO, COORD, ENABLE_VIRTUAL_TERMINAL_PROCESSING,
    };

    use super::LineClearer;

    /// Clears lines through the console screen-buffer API.
    #[derive(Debug)]
    pub struct ConsoleClearer {
        handle: HANDLE,
    }

    impl ConsoleClearer {
        /// Returns a native clearer when `handle` is a console without VT support.
        pub(crate) fn detect(handle: RawHandle) -> Option<Self> {
            let handle = handle as HANDLE;
            let mut mode = 0;
            // SAFETY: `mode` is a valid out pointer for the duration of the call.
            if unsafe { GetConsoleMode(handle, &mut mode) } == 0 {
                return None;
            }
            if mode & ENABLE_VIRTUAL_TERMINAL_PROCESSING != 0 {
                return None;
            }
            // SAFETY: plain FFI call on a handle we just confirmed is a console.
            if unsafe { SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING) } != 0 {
                return None;
            }
            Some(Self { handle })
        }
    }

    impl LineClearer for ConsoleClearer {
        fn clear_lines(&mut self, device: &mut dyn Write, n: usize) -> io::Result<()> {
            // Pending bytes must reach the console before the cursor moves.
            device.flush()?;

            // SAFETY: zeroed is a valid bit pattern for this plain C struct.
            let mut info: CONSOLE_SCREEN_BUFFER_INFO = unsafe { std::mem::zeroed() };
            // SAFETY: `info` is a valid out pointer for the duration of the call.
            if unsafe { GetConsoleScreenBufferInfo(self.handle, &mut info) } == 0 {
                return Err(io::Error::last_os_error());
            }

            let n = i16::try_from(n).unwrap_or(i16::MAX);
            let width = u32::try_from(info.dwSize.X).unwrap_or(0);
            for i in 0..=n {
                let y = info.dwCursorPosition.Y.saturating_sub(i);
                if y < 0 {
                    break;
                }
                let origin = COORD { X: info.srWindow.Left, Y: y };
                let mut written = 0u32;
                // SAFETY: `written` is a valid out pointer; the coordinates are
                // inside the screen buffer reported above.
                if unsafe { FillConsoleOutputCharacterW(self.handle, u16::from(b' '), width, origin, &mut written) } == 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            let target = COORD {
                X: 0,
                Y: info.dwCursorPosition.Y.saturating_sub(n).max(0),
            };
            // SAFETY: plain FFI call with a coordinate inside the buffer.
            if unsafe { SetConsoleCursorPosition(self.handle, target) } == 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }
}
