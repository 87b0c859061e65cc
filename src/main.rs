use lc3_vm::emulator;
use lc3_vm::errors::ExecutionError;
use lc3_vm::terminal::{self, RawModeOutput};
use std::env;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    let mut emulator = match emulator::from_program(&path) {
        Ok(emulator) => emulator,
        Err(e) => {
            eprintln!("Cannot load {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let raw = terminal::set_terminal_raw();
    let mut output = RawModeOutput::new(io::stdout().lock(), raw.is_active());
    let result = emulator.execute_with(&mut output);
    // Restore the terminal before touching stdout or stderr again.
    drop(output);
    drop(raw);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExecutionError::Interrupted) => {
            println!();
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
