//! # LC-3 Emulator.
//!
//! `lc3-vm` executes programs for the Little Computer 3, a 16 bit educational
//! architecture with eight general purpose registers, 65536 words of memory,
//! a memory-mapped keyboard and a trap layer for console I/O.
//!
//! Program images are big-endian word streams whose first word is the load
//! origin. Loading one yields a machine ready to run on the terminal:
//!
//! ```no_run
//! use lc3_vm::emulator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut emulator = emulator::from_program("2048.obj")?;
//! emulator.execute()?;
//! # Ok(())
//! # }
//! ```
//!
//! Keyboard and console are injectable, so a machine can also run headless
//! against scripted input and an in-memory writer:
//!
//! ```
//! use lc3_vm::emulator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // An image holding a single HALT trap at the default origin.
//! let mut emulator = emulator::from_program_bytes(&[0x30, 0x00, 0xF0, 0x25])?;
//! let mut output = Vec::new();
//! emulator.execute_with(&mut output)?;
//! assert!(emulator.is_halted());
//! # Ok(())
//! # }
//! ```

pub mod emulator;
pub mod errors;
pub mod hardware;
pub mod terminal;
