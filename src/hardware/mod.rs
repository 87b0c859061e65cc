//! The machine state: registers, addressable memory, and the keyboard device
//! behind the memory map.

pub mod keyboard;
pub mod memory;
pub mod registers;

pub use keyboard::{KeyboardInputProvider, ScriptedInputProvider, TerminalInputProvider};
pub use memory::{DeviceRegister, MEMORY_SIZE, Memory};
pub use registers::{ConditionFlag, PROGRAM_START, Registers};
