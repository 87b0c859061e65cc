//! Service routines behind the TRAP instruction.
use crate::emulator::ExecutionState;
use crate::errors::ExecutionError;
use crate::hardware::keyboard::KeyboardInputProvider;
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use std::cell::RefCell;
use std::io::Write;

/// The service routines reachable through TRAP's 8 bit vector field.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, enumn::N)]
pub enum TrapVector {
    /// Read one character into R0, no echo
    GetC = 0x20,
    /// Write the character in R0
    Out = 0x21,
    /// Write the string of words starting at the address in R0
    PutS = 0x22,
    /// Prompt, read one character into R0, echo it
    In = 0x23,
    /// Write the byte-packed string starting at the address in R0
    PutSp = 0x24,
    /// Stop the machine
    Halt = 0x25,
}

/// Runs the service routine named by `vector`.
///
/// A vector outside the implemented set is a no-op; the machine keeps
/// running. Only HALT yields [`ExecutionState::Halted`].
///
/// # Errors
/// Console write failures surface as [`ExecutionError::Io`], an interrupted
/// blocking read as [`ExecutionError::Interrupted`].
pub(crate) fn dispatch(
    vector: u8,
    registers: &mut Registers,
    memory: &mut Memory,
    keyboard: &RefCell<dyn KeyboardInputProvider>,
    output: &mut impl Write,
) -> Result<ExecutionState, ExecutionError> {
    let Some(routine) = TrapVector::n(vector) else {
        return Ok(ExecutionState::Running);
    };
    match routine {
        TrapVector::GetC => get_c(registers, keyboard)?,
        TrapVector::Out => out(registers, output)?,
        TrapVector::PutS => put_s(registers, memory, output)?,
        TrapVector::In => in_trap(registers, keyboard, output)?,
        TrapVector::PutSp => put_sp(registers, memory, output)?,
        TrapVector::Halt => return halt(output),
    }
    Ok(ExecutionState::Running)
}

/// GETC: reads a single character from the keyboard into R0.
///
/// The character is not echoed. The high byte of R0 is cleared; the
/// condition flags stay untouched.
///
/// # Errors
/// [`ExecutionError::Interrupted`] when the read was cancelled.
pub fn get_c(
    registers: &mut Registers,
    keyboard: &RefCell<dyn KeyboardInputProvider>,
) -> Result<(), ExecutionError> {
    let byte = keyboard.borrow_mut().read_char()?;
    registers.set(0, u16::from(byte));
    Ok(())
}

/// OUT: writes the character in R0's low byte.
///
/// # Errors
/// [`ExecutionError::Io`] when the console write fails.
pub fn out(registers: &Registers, output: &mut impl Write) -> Result<(), ExecutionError> {
    let [low, _] = registers.get(0).to_le_bytes();
    output.write_all(&[low])?;
    output.flush()?;
    Ok(())
}

/// IN: prompts for a single character, echoes it, stores it in R0.
///
/// Like GETC otherwise: high byte cleared, flags untouched.
///
/// # Errors
/// [`ExecutionError::Io`] on write failure, [`ExecutionError::Interrupted`]
/// on a cancelled read.
pub fn in_trap(
    registers: &mut Registers,
    keyboard: &RefCell<dyn KeyboardInputProvider>,
    output: &mut impl Write,
) -> Result<(), ExecutionError> {
    output.write_all(b"Enter a character: ")?;
    output.flush()?;
    let byte = keyboard.borrow_mut().read_char()?;
    output.write_all(&[byte])?;
    output.flush()?;
    registers.set(0, u16::from(byte));
    Ok(())
}

/// PUTS: writes the string starting at the address in R0, one character per
/// word, until a zero word.
///
/// # Errors
/// [`ExecutionError::Io`] when the console write fails.
pub fn put_s(
    registers: &Registers,
    memory: &mut Memory,
    output: &mut impl Write,
) -> Result<(), ExecutionError> {
    write_string(registers, memory, output, push_low_byte)
}

/// PUTSP: packed variant of PUTS, two characters per word.
///
/// The low byte of each word goes out first; a zero high byte in the last
/// word is allowed and skipped. A zero word ends the string.
///
/// # Errors
/// [`ExecutionError::Io`] when the console write fails.
pub fn put_sp(
    registers: &Registers,
    memory: &mut Memory,
    output: &mut impl Write,
) -> Result<(), ExecutionError> {
    write_string(registers, memory, output, push_packed_bytes)
}

/// HALT: writes the completion marker and stops the machine.
///
/// # Errors
/// [`ExecutionError::Io`] when the console write fails.
pub fn halt(output: &mut impl Write) -> Result<ExecutionState, ExecutionError> {
    output.write_all(b"\nProgram halted\n")?;
    output.flush()?;
    Ok(ExecutionState::Halted)
}

fn push_low_byte(word: u16, bytes: &mut Vec<u8>) {
    let [low, _] = word.to_le_bytes();
    bytes.push(low);
}

fn push_packed_bytes(word: u16, bytes: &mut Vec<u8>) {
    let [low, high] = word.to_le_bytes();
    bytes.push(low);
    if high != 0 {
        bytes.push(high);
    }
}

/// Walks memory from the address in R0 up to a zero word, collecting bytes
/// with `push_bytes`, then writes the burst and flushes once.
fn write_string(
    registers: &Registers,
    memory: &mut Memory,
    output: &mut impl Write,
    push_bytes: fn(u16, &mut Vec<u8>),
) -> Result<(), ExecutionError> {
    let mut address = registers.get(0);
    let mut bytes = Vec::with_capacity(120);
    loop {
        let word = memory.read(address);
        if word == 0 {
            break;
        }
        push_bytes(word, &mut bytes);
        address = address.wrapping_add(1);
    }
    output.write_all(&bytes)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::test_helpers::StringWriter;
    use crate::hardware::keyboard::ScriptedInputProvider;
    use googletest::prelude::*;

    fn memory_without_input() -> Memory {
        use std::rc::Rc;
        let keyboard: Rc<RefCell<dyn KeyboardInputProvider>> =
            Rc::new(RefCell::new(ScriptedInputProvider::new(&[])));
        Memory::new(keyboard)
    }

    #[gtest]
    pub fn test_get_c_stores_the_byte_without_echo() {
        let keyboard = RefCell::new(ScriptedInputProvider::new(b"a"));
        let mut regs = Registers::new();
        regs.set(0, 0xFFFF); // high byte must be cleared
        get_c(&mut regs, &keyboard).unwrap();
        expect_that!(regs.get(0), eq(u16::from(b'a')));
    }

    #[gtest]
    pub fn test_get_c_interrupted_read() {
        let mut provider = ScriptedInputProvider::new(b"");
        provider.interrupt();
        let keyboard = RefCell::new(provider);
        let mut regs = Registers::new();
        let error = get_c(&mut regs, &keyboard).unwrap_err();
        assert_that!(error.to_string(), eq("execution was interrupted"));
    }

    #[gtest]
    pub fn test_out_writes_the_low_byte() {
        let mut regs = Registers::new();
        regs.set(0, 0x016B); // 'k' with a dirty high byte
        let mut writer = StringWriter::new();
        out(&regs, &mut writer).unwrap();
        assert_that!(writer.contents(), eq("k"));
    }

    #[gtest]
    pub fn test_in_prompts_and_echoes() {
        let keyboard = RefCell::new(ScriptedInputProvider::new(b"abc"));
        let mut regs = Registers::new();
        let mut writer = StringWriter::new();
        in_trap(&mut regs, &keyboard, &mut writer).unwrap();
        assert_that!(writer.contents(), eq("Enter a character: a"));
        expect_that!(regs.get(0), eq(u16::from(b'a')));
    }

    #[gtest]
    pub fn test_put_s_stops_at_the_zero_word() {
        let mut memory = memory_without_input();
        for (address, byte) in (0x3005..).zip(b"Hi") {
            memory.write(address, u16::from(*byte));
        }
        memory.write(0x3008, u16::from(b'!')); // past the terminator
        let mut regs = Registers::new();
        regs.set(0, 0x3005);
        let mut writer = StringWriter::new();
        put_s(&regs, &mut memory, &mut writer).unwrap();
        assert_that!(writer.contents(), eq("Hi"));
    }

    #[gtest]
    pub fn test_put_sp_unpacks_two_characters_per_word() {
        let data = [0x6548u16, 0x6C6C, 0x206F, 0x6F57, 0x6C72, 0x2164];
        let mut memory = memory_without_input();
        for (address, word) in (0x3005..).zip(data) {
            memory.write(address, word);
        }
        let mut regs = Registers::new();
        regs.set(0, 0x3005);
        let mut writer = StringWriter::new();
        put_sp(&regs, &mut memory, &mut writer).unwrap();
        assert_that!(writer.contents(), eq("Hello World!"));
    }

    #[gtest]
    pub fn test_put_sp_skips_a_zero_high_byte_in_the_last_word() {
        let mut memory = memory_without_input();
        memory.write(0x3005, 0x6261); // "ab"
        memory.write(0x3006, 0x0063); // "c" with an empty high byte
        let mut regs = Registers::new();
        regs.set(0, 0x3005);
        let mut writer = StringWriter::new();
        put_sp(&regs, &mut memory, &mut writer).unwrap();
        assert_that!(writer.contents(), eq("abc"));
    }

    #[gtest]
    pub fn test_halt_writes_the_marker_and_stops() {
        let mut writer = StringWriter::new();
        let state = halt(&mut writer).unwrap();
        expect_that!(state, eq(ExecutionState::Halted));
        assert_that!(writer.contents(), eq("\nProgram halted\n"));
    }

    #[gtest]
    pub fn test_dispatch_ignores_an_unknown_vector() {
        let mut regs = Registers::new();
        let mut memory = memory_without_input();
        let keyboard = RefCell::new(ScriptedInputProvider::new(&[]));
        let mut writer = StringWriter::new();
        let state = dispatch(0x26, &mut regs, &mut memory, &keyboard, &mut writer).unwrap();
        expect_that!(state, eq(ExecutionState::Running));
        assert_that!(writer.contents(), eq(""));
    }
}
