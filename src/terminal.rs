//! Raw-mode handling for the interactive console.
use crossterm::terminal;
use std::io;
use std::io::{IsTerminal, Write};

/// Keeps the terminal in raw mode while alive; dropping restores it.
#[must_use = "raw mode ends when the lock is dropped"]
pub struct RawLock {
    enabled: bool,
}

impl RawLock {
    /// Whether raw mode was actually enabled.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.enabled
    }
}

impl Drop for RawLock {
    fn drop(&mut self) {
        if self.enabled
            && let Err(e) = terminal::disable_raw_mode()
        {
            eprintln!("Error restoring terminal: {e}");
        }
    }
}

/// Puts the terminal into raw mode for the lifetime of the returned lock.
///
/// Raw mode hands key presses to the keyboard device one at a time, without
/// line buffering or echo. Best effort: piped stdin leaves the terminal
/// alone, and an enable failure is only reported on stderr.
pub fn set_terminal_raw() -> RawLock {
    if !io::stdin().is_terminal() {
        return RawLock { enabled: false };
    }
    match terminal::enable_raw_mode() {
        Ok(()) => RawLock { enabled: true },
        Err(e) => {
            eprintln!("Could not set terminal to raw mode: {e}");
            RawLock { enabled: false }
        }
    }
}

/// Writer adapter expanding `\n` to `\r\n` while raw mode is active.
///
/// Raw mode turns off the terminal's own output post-processing, so program
/// output would stair-step across the screen without the expansion.
pub struct RawModeOutput<W: Write> {
    inner: W,
    expand_newlines: bool,
}

impl<W: Write> RawModeOutput<W> {
    pub const fn new(inner: W, expand_newlines: bool) -> Self {
        Self {
            inner,
            expand_newlines,
        }
    }
}

impl<W: Write> Write for RawModeOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.expand_newlines {
            return self.inner.write(buf);
        }
        for chunk in buf.split_inclusive(|byte| *byte == b'\n') {
            match chunk.split_last() {
                Some((&b'\n', head)) => {
                    self.inner.write_all(head)?;
                    self.inner.write_all(b"\r\n")?;
                }
                _ => self.inner.write_all(chunk)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    pub fn test_raw_mode_output_expands_newlines() {
        let mut buffer = Vec::new();
        let mut out = RawModeOutput::new(&mut buffer, true);
        out.write_all(b"a\nbc\n\n").unwrap();
        assert_that!(buffer, eq(b"a\r\nbc\r\n\r\n"));
    }

    #[gtest]
    pub fn test_raw_mode_output_leaves_the_tail_alone() {
        let mut buffer = Vec::new();
        let mut out = RawModeOutput::new(&mut buffer, true);
        out.write_all(b"no newline").unwrap();
        assert_that!(buffer, eq(b"no newline"));
    }

    #[gtest]
    pub fn test_raw_mode_output_passes_through_when_inactive() {
        let mut buffer = Vec::new();
        let mut out = RawModeOutput::new(&mut buffer, false);
        out.write_all(b"a\nb").unwrap();
        assert_that!(buffer, eq(b"a\nb"));
    }
}
