use crossterm::event::{self, KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::io::{self, IsTerminal, Read};
use std::time::Duration;

/// Console input as the machine sees it: a pollable, blocking source of bytes.
///
/// The memory map polls through this for the keyboard status register; the
/// GETC and IN traps block on it.
pub trait KeyboardInputProvider {
    /// Non-blocking availability check. After `Ok(true)` the next
    /// [`Self::read_char`] returns without blocking.
    ///
    /// # Errors
    /// Underlying console failures; callers on the memory path treat any
    /// error as "no key ready".
    fn poll_ready(&mut self) -> io::Result<bool>;

    /// Blocks until one input byte is available and returns it.
    ///
    /// # Errors
    /// [`io::ErrorKind::Interrupted`] when the wait ends because the user
    /// cancelled, other kinds for console failures.
    fn read_char(&mut self) -> io::Result<u8>;

    /// True once a cancellation request (Ctrl-C) has been observed.
    fn is_interrupted(&self) -> bool;
}

/// Keyboard input from the interactive terminal via crossterm events.
///
/// When stdin is not a terminal (piped input) the event stream is useless, so
/// bytes are read straight from stdin instead and polling always reports
/// ready; a read at end of input then fails with
/// [`io::ErrorKind::UnexpectedEof`].
pub struct TerminalInputProvider {
    pending: Option<u8>,
    interrupted: bool,
    use_events: bool,
}

impl TerminalInputProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: None,
            interrupted: false,
            use_events: io::stdin().is_terminal(),
        }
    }
}

impl Default for TerminalInputProvider {
    fn default() -> Self {
        Self::new()
    }
}

const fn is_cancel(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn key_press_byte(code: KeyCode) -> Option<u8> {
    match code {
        KeyCode::Enter => Some(b'\n'),
        KeyCode::Char(c) => u8::try_from(u32::from(c)).ok(),
        _ => None,
    }
}

impl KeyboardInputProvider for TerminalInputProvider {
    fn poll_ready(&mut self) -> io::Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        if !self.use_events {
            // Piped stdin either has bytes or hits end of input on read.
            return Ok(true);
        }
        while event::poll(Duration::ZERO)? {
            if let Some(key) = event::read()?.as_key_press_event() {
                if is_cancel(&key) {
                    self.interrupted = true;
                } else if let Some(byte) = key_press_byte(key.code) {
                    self.pending = Some(byte);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn read_char(&mut self) -> io::Result<u8> {
        if let Some(byte) = self.pending.take() {
            return Ok(byte);
        }
        if !self.use_events {
            let mut byte = [0; 1];
            io::stdin().read_exact(&mut byte)?;
            return Ok(byte[0]);
        }
        loop {
            if let Some(key) = event::read()?.as_key_press_event() {
                if is_cancel(&key) {
                    self.interrupted = true;
                    return Err(io::Error::from(io::ErrorKind::Interrupted));
                }
                if let Some(byte) = key_press_byte(key.code) {
                    return Ok(byte);
                }
            }
        }
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted
    }
}

/// Deterministic keyboard for tests and embedders: serves a fixed byte script.
///
/// Polling reports ready while script bytes remain; reading past the end is
/// [`io::ErrorKind::UnexpectedEof`]. [`Self::interrupt`] plays the role of a
/// Ctrl-C: the flag is raised and the next read fails with
/// [`io::ErrorKind::Interrupted`].
pub struct ScriptedInputProvider {
    script: VecDeque<u8>,
    interrupted: bool,
}

impl ScriptedInputProvider {
    #[must_use]
    pub fn new(script: &[u8]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            interrupted: false,
        }
    }

    /// Requests cancellation, as Ctrl-C would.
    pub const fn interrupt(&mut self) {
        self.interrupted = true;
    }
}

impl KeyboardInputProvider for ScriptedInputProvider {
    fn poll_ready(&mut self) -> io::Result<bool> {
        Ok(!self.script.is_empty())
    }

    fn read_char(&mut self) -> io::Result<u8> {
        if self.interrupted {
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.script
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted
    }
}
