//! The machine itself: fetch-decode-execute loop and program loading.
pub mod image;
pub mod instruction;
pub mod opcodes;
#[cfg(test)]
mod test_helpers;
pub mod trap_routines;

pub use image::ProgramImage;

use crate::errors::{ExecutionError, ProgramLoadError};
use crate::hardware::keyboard::{KeyboardInputProvider, TerminalInputProvider};
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use instruction::Instruction;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::io;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

/// Whether the machine will execute another instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// The next step fetches and executes.
    Running,
    /// The HALT trap was serviced.
    Halted,
}

/// One LC-3 machine: registers, memory and the keyboard wired into both the
/// memory map and the trap layer.
///
/// Loading places a [`ProgramImage`] into memory; execution always begins at
/// the fixed program start address the registers reset to.
pub struct Emulator {
    registers: Registers,
    memory: Memory,
    keyboard: Rc<RefCell<dyn KeyboardInputProvider>>,
    state: ExecutionState,
}

impl Emulator {
    /// A machine reading its keyboard from the terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::with_keyboard(Rc::new(RefCell::new(TerminalInputProvider::new())))
    }

    /// A machine with an injected keyboard, for tests and embedders.
    #[must_use]
    pub fn with_keyboard(keyboard: Rc<RefCell<dyn KeyboardInputProvider>>) -> Self {
        Self {
            registers: Registers::new(),
            memory: Memory::new(Rc::clone(&keyboard)),
            keyboard,
            state: ExecutionState::Running,
        }
    }

    /// Places the image's words into memory at its origin.
    pub fn load_image(&mut self, image: &ProgramImage) {
        self.memory.load_image(image);
    }

    /// Fetches, decodes and executes a single instruction, writing any
    /// program output to `output`.
    ///
    /// This is the raw machine cycle: it does not check the state first, so
    /// driving a halted machine executes whatever the pc points at.
    /// [`Self::execute_with`] is the loop that respects [`ExecutionState::Halted`].
    ///
    /// # Errors
    /// See [`ExecutionError`]; the failed instruction leaves `state` unchanged.
    pub fn step(&mut self, output: &mut impl Write) -> Result<ExecutionState, ExecutionError> {
        let word = self.memory.read(self.registers.pc());
        self.registers.advance_pc();
        let state = opcodes::dispatch(
            Instruction::from(word),
            &mut self.registers,
            &mut self.memory,
            &self.keyboard,
            output,
        )?;
        self.state = state;
        Ok(state)
    }

    /// Runs from the current pc until the machine halts, writing program
    /// output to `output`.
    ///
    /// # Errors
    /// [`ExecutionError::Interrupted`] as soon as the keyboard reports a
    /// cancellation request, checked before every fetch; otherwise whatever
    /// [`Self::step`] raises.
    pub fn execute_with(&mut self, output: &mut impl Write) -> Result<(), ExecutionError> {
        while self.state == ExecutionState::Running {
            if self.keyboard.borrow().is_interrupted() {
                return Err(ExecutionError::Interrupted);
            }
            self.step(output)?;
        }
        Ok(())
    }

    /// [`Self::execute_with`] on locked stdout.
    ///
    /// # Errors
    /// See [`Self::execute_with`].
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        self.execute_with(&mut io::stdout().lock())
    }

    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }

    #[must_use]
    pub const fn state(&self) -> ExecutionState {
        self.state
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        matches!(self.state, ExecutionState::Halted)
    }

    /// Returns the registers to their reset state and re-arms a halted
    /// machine, so a loaded image can run again. Memory is left as the last
    /// run left it.
    pub const fn reset_registers(&mut self) {
        self.registers.reset();
        self.state = ExecutionState::Running;
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Emulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("state", &self.state)
            .field("registers", &self.registers)
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}

/// A terminal-backed machine with the image file at `path` loaded.
///
/// # Errors
/// [`ProgramLoadError`] when the file cannot be read or is missing its
/// origin word; the machine is never constructed in that case.
pub fn from_program(path: impl AsRef<Path>) -> Result<Emulator, ProgramLoadError> {
    let image = ProgramImage::from_file(path)?;
    let mut emulator = Emulator::new();
    emulator.load_image(&image);
    Ok(emulator)
}

/// A terminal-backed machine with an in-memory image loaded.
///
/// # Errors
/// [`ProgramLoadError::MissingOriginHeader`] when `bytes` holds no origin
/// word.
pub fn from_program_bytes(bytes: &[u8]) -> Result<Emulator, ProgramLoadError> {
    let image = ProgramImage::from_bytes(bytes)?;
    let mut emulator = Emulator::new();
    emulator.load_image(&image);
    Ok(emulator)
}
