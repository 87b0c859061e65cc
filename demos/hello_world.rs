use lc3_vm::emulator::{Emulator, ProgramImage};
use lc3_vm::hardware::PROGRAM_START;
use std::error::Error;

/// Point R0 at the text that follows the code, print it, halt.
fn hello_world_image() -> ProgramImage {
    let mut words = vec![0xE002, 0xF022, 0xF025];
    words.extend("Hello World!\n".bytes().map(u16::from));
    words.push(0);
    ProgramImage::new(PROGRAM_START, words)
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut emulator = Emulator::new();
    emulator.load_image(&hello_world_image());
    emulator.execute()?;
    emulator.reset_registers();
    emulator.execute()?;
    Ok(())
}
