//! Output devices and capability probing.
//!
//! A [`Terminal`] is the sink the engine owns. Besides being writable it
//! answers two questions once, at construction: does it support in-place
//! redraw, and how are lines erased on it.

use std::fs::File;
use std::io::{IsTerminal, Stderr, Stdout, Write};

use crate::clear::{AnsiClearer, LineClearer};

/// A writable output device the status engine can own.
pub trait Terminal: Write + Send + 'static {
    /// Reports whether the device is a live interactive terminal.
    ///
    /// Non-interactive devices get passthrough output: status updates are
    /// dropped and writes are forwarded unchanged.
    fn is_interactive(&self) -> bool;

    /// Returns the strategy used to erase status lines on this device.
    fn line_clearer(&self) -> Box<dyn LineClearer> {
        Box::new(AnsiClearer)
    }
}

/// Returns false when `TERM` declares a terminal without cursor control.
#[must_use]
pub fn term_supports_cursor_control() -> bool {
    !matches!(std::env::var("TERM").as_deref(), Ok("dumb"))
}

macro_rules! impl_std_terminal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Terminal for $ty {
                fn is_interactive(&self) -> bool {
                    self.is_terminal() && term_supports_cursor_control()
                }

                #[cfg(windows)]
                fn line_clearer(&self) -> Box<dyn LineClearer> {
                    use std::os::windows::io::AsRawHandle;
                    crate::clear::console_clearer(self.as_raw_handle())
                }
            }
        )*
    };
}

impl_std_terminal!(Stdout, Stderr, File);

impl<T: Terminal + ?Sized> Terminal for Box<T> {
    fn is_interactive(&self) -> bool {
        (**self).is_interactive()
    }

    fn line_clearer(&self) -> Box<dyn LineClearer> {
        (**self).line_clearer()
    }
}
