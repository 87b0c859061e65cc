use displaydoc::Display;
use std::error::Error;
use std::io;

/// Failure to turn a program image into loadable memory contents.
///
/// Loading happens before the machine starts; none of these leave a partially
/// running emulator behind.
#[derive(Display, Debug)]
pub enum ProgramLoadError {
    /// program image is missing the origin word
    MissingOriginHeader,
    /// program image could not be read: {0}
    Io(io::Error),
}

impl Error for ProgramLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingOriginHeader => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for ProgramLoadError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// A condition that stops the execution engine before it reaches HALT.
#[derive(Display, Debug)]
pub enum ExecutionError {
    /// reserved opcode {opcode:#06b} at address {address:#06X}
    ReservedOpcode {
        /// The 4 bit opcode field of the faulting instruction word.
        opcode: u8,
        /// Address the faulting instruction was fetched from.
        address: u16,
    },
    /// execution was interrupted
    Interrupted,
    /// console I/O failed: {0}
    Io(io::Error),
}

impl Error for ExecutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReservedOpcode { .. } | Self::Interrupted => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for ExecutionError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::Interrupted {
            Self::Interrupted
        } else {
            Self::Io(e)
        }
    }
}
