use crate::emulator::image::ProgramImage;
use crate::emulator::{Emulator, ExecutionState};
use crate::errors::ExecutionError;
use crate::hardware::keyboard::{KeyboardInputProvider, ScriptedInputProvider};
use crate::hardware::registers::PROGRAM_START;
use std::cell::RefCell;
use std::io;
use std::io::Write;
use std::rc::Rc;

/// In-memory console capturing everything the machine writes.
pub struct StringWriter {
    bytes: Vec<u8>,
}

impl Write for StringWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.bytes.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StringWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(120),
        }
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.bytes.clone()).unwrap()
    }
}

/// An emulator wired to a scripted keyboard and a captured console.
///
/// `words` land at the program start address, so the machine is ready to
/// step or run straight away.
pub struct FakeEmulator {
    pub inner: Emulator,
    pub keyboard: Rc<RefCell<ScriptedInputProvider>>,
    pub output: StringWriter,
}

impl FakeEmulator {
    pub fn new(words: &[u16], input: &[u8]) -> Self {
        let keyboard = Rc::new(RefCell::new(ScriptedInputProvider::new(input)));
        let provider: Rc<RefCell<dyn KeyboardInputProvider>> = keyboard.clone();
        let mut inner = Emulator::with_keyboard(provider);
        inner.load_image(&ProgramImage::new(PROGRAM_START, words.to_vec()));
        Self {
            inner,
            keyboard,
            output: StringWriter::new(),
        }
    }

    pub fn step(&mut self) -> Result<ExecutionState, ExecutionError> {
        self.inner.step(&mut self.output)
    }

    pub fn run(&mut self) -> Result<(), ExecutionError> {
        self.inner.execute_with(&mut self.output)
    }

    pub fn output(&self) -> String {
        self.output.contents()
    }
}
