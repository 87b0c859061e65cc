//! The sixteen operations of the instruction set and their dispatcher.
use crate::emulator::ExecutionState;
use crate::emulator::instruction::Instruction;
use crate::emulator::trap_routines;
use crate::errors::ExecutionError;
use crate::hardware::keyboard::KeyboardInputProvider;
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use std::cell::RefCell;
use std::io::Write;

/// The operation encoded in bits 15..=12 of an instruction word.
///
/// Discriminants are the architecture's encoding, so [`Opcode::n`] maps a
/// decoded opcode field straight to its variant.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, enumn::N)]
pub enum Opcode {
    /// Conditional branch
    Br = 0,
    /// Addition
    Add = 1,
    /// Load, PC-relative
    Ld = 2,
    /// Store, PC-relative
    St = 3,
    /// Jump to subroutine
    Jsr = 4,
    /// Bit-wise AND
    And = 5,
    /// Load, base register plus offset
    Ldr = 6,
    /// Store, base register plus offset
    Str = 7,
    /// Return from interrupt (unsupported)
    Rti = 8,
    /// Bit-wise complement
    Not = 9,
    /// Load indirect
    Ldi = 10,
    /// Store indirect
    Sti = 11,
    /// Jump / return from subroutine
    Jmp = 12,
    /// Reserved (unsupported)
    Res = 13,
    /// Load effective address
    Lea = 14,
    /// Execute trap service routine
    Trap = 15,
}

/// Executes one decoded instruction against the machine state.
///
/// TRAP hands over to the trap dispatcher, which is where [`ExecutionState::Halted`]
/// can come from. The reserved encodings RES and RTI stop the machine with an
/// error naming the faulting address.
///
/// # Errors
/// [`ExecutionError::ReservedOpcode`] for RES/RTI, or whatever a trap service
/// routine raises.
pub(crate) fn dispatch(
    i: Instruction,
    r: &mut Registers,
    memory: &mut Memory,
    keyboard: &RefCell<dyn KeyboardInputProvider>,
    output: &mut impl Write,
) -> Result<ExecutionState, ExecutionError> {
    let opcode = Opcode::n(i.op_code()).expect("opcode field is four bits wide");
    match opcode {
        Opcode::Br => br(i, r),
        Opcode::Add => add(i, r),
        Opcode::Ld => ld(i, r, memory),
        Opcode::St => st(i, r, memory),
        Opcode::Jsr => jsr(i, r),
        Opcode::And => and(i, r),
        Opcode::Ldr => ldr(i, r, memory),
        Opcode::Str => str(i, r, memory),
        Opcode::Not => not(i, r),
        Opcode::Ldi => ldi(i, r, memory),
        Opcode::Sti => sti(i, r, memory),
        Opcode::Jmp => jmp_or_ret(i, r),
        Opcode::Lea => lea(i, r),
        Opcode::Trap => {
            return trap_routines::dispatch(i.trap_vector(), r, memory, keyboard, output);
        }
        Opcode::Rti | Opcode::Res => {
            return Err(ExecutionError::ReservedOpcode {
                opcode: i.op_code(),
                // The pc already moved past the faulting word.
                address: r.pc().wrapping_sub(1),
            });
        }
    }
    Ok(ExecutionState::Running)
}

/// ADD: addition in 2 variants, result flags updated.
/// - DR = SR1 + SR2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0001 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR = SR1 + sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0001 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
/// Addition wraps modulo 2^16.
pub fn add(i: Instruction, r: &mut Registers) {
    let rhs = if i.is_immediate() {
        i.imm5()
    } else {
        r.get(i.sr2_number())
    };
    r.set(i.dr_number(), r.get(i.sr1_number()).wrapping_add(rhs));
    r.update_condition_flags(i.dr_number());
}

/// AND: bit-wise AND in 2 variants, result flags updated.
/// - DR = SR1 AND SR2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0101 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR = SR1 AND sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0101 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn and(i: Instruction, r: &mut Registers) {
    let rhs = if i.is_immediate() {
        i.imm5()
    } else {
        r.get(i.sr2_number())
    };
    r.set(i.dr_number(), r.get(i.sr1_number()) & rhs);
    r.update_condition_flags(i.dr_number());
}

/// NOT: bit-wise complement of SR1, result flags updated.
/// ```text
///  15__12__11_9__8_6___5___0_
/// | 1001 |  DR | SR1 | 11111 |
///  --------------------------
/// ```
pub fn not(i: Instruction, r: &mut Registers) {
    r.set(i.dr_number(), !r.get(i.sr1_number()));
    r.update_condition_flags(i.dr_number());
}

/// BR: conditional branch.
/// ```text
///  15__12__11_9___8_______0_
/// | 0000 |  nzp | PCoffset9 |
///  -------------------------
/// ```
/// The branch is taken when the current condition flag's bit is set in the
/// `nzp` mask; an all-zero mask never branches.
pub fn br(i: Instruction, r: &mut Registers) {
    if i.condition_mask() & r.condition_flag().mask_bit() != 0 {
        r.set_pc(pc_relative_address(i, r));
    }
}

/// JSR: jump to subroutine, 2 variants.
/// - PC-relative with an 11 bit offset
/// ```text
///  15__12__11_10_________0
/// | 0100 | 1 | PCOffset11 |
///  -----------------------
/// ```
/// - JSRR through `BaseR`
/// ```text
///  15__12__11_9__8___6___5____0_
/// | 0100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// R7 receives the return address before the base register is read, so
/// `JSRR R7` jumps to its own return address.
pub fn jsr(i: Instruction, r: &mut Registers) {
    r.set(7, r.pc());
    if i.is_long_jump() {
        r.set_pc(r.pc().wrapping_add(i.pc_offset(11)));
    } else {
        r.set_pc(r.get(i.base_r_number()));
    }
}

/// JMP: sets the PC to the value of `BaseR`. The assembler alias RET is the
/// encoding with `BaseR` = R7, returning from a JSR.
/// ```text
///  15__12__11_9___8_6____5____0_
/// | 1100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
pub fn jmp_or_ret(i: Instruction, r: &mut Registers) {
    r.set_pc(r.get(i.base_r_number()));
}

/// LD: loads the word at PC + sign extended offset into DR, flags updated.
/// ```text
///  15__12__11_9___8_______0_
/// | 0010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ld(i: Instruction, r: &mut Registers, memory: &mut Memory) {
    let value = memory.read(pc_relative_address(i, r));
    r.set(i.dr_number(), value);
    r.update_condition_flags(i.dr_number());
}

/// LDI: load indirect. The word at PC + sign extended offset is an address;
/// the word at that address lands in DR, flags updated.
/// ```text
///  15__12__11_9___8_______0_
/// | 1010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
/// Both reads go through [`Memory::read`], so an indirection cell may name a
/// device register.
pub fn ldi(i: Instruction, r: &mut Registers, memory: &mut Memory) {
    let pointer = memory.read(pc_relative_address(i, r));
    let value = memory.read(pointer);
    r.set(i.dr_number(), value);
    r.update_condition_flags(i.dr_number());
}

/// LDR: loads the word at `BaseR` + sign extended 6 bit offset into DR,
/// flags updated.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0110 |  DR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn ldr(i: Instruction, r: &mut Registers, memory: &mut Memory) {
    let value = memory.read(base_relative_address(i, r));
    r.set(i.dr_number(), value);
    r.update_condition_flags(i.dr_number());
}

/// LEA: loads PC + sign extended offset itself into DR. The architecture
/// updates the flags here too, even though no memory was read.
/// ```text
///  15__12__11_9___8_______0_
/// | 1110 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn lea(i: Instruction, r: &mut Registers) {
    r.set(i.dr_number(), pc_relative_address(i, r));
    r.update_condition_flags(i.dr_number());
}

/// ST: stores SR at PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 0011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn st(i: Instruction, r: &Registers, memory: &mut Memory) {
    memory.write(pc_relative_address(i, r), r.get(i.dr_number()));
}

/// STI: store indirect. The word at PC + sign extended offset is an address;
/// SR is stored there.
/// ```text
///  15__12__11_9___8_______0_
/// | 1011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn sti(i: Instruction, r: &Registers, memory: &mut Memory) {
    let target = memory.read(pc_relative_address(i, r));
    memory.write(target, r.get(i.dr_number()));
}

/// STR: stores SR at `BaseR` + sign extended 6 bit offset.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0111 |  SR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn str(i: Instruction, r: &Registers, memory: &mut Memory) {
    memory.write(base_relative_address(i, r), r.get(i.dr_number()));
}

/// PC + sign extended 9 bit offset, relative to the already advanced pc.
fn pc_relative_address(i: Instruction, r: &Registers) -> u16 {
    r.pc().wrapping_add(i.pc_offset(9))
}

fn base_relative_address(i: Instruction, r: &Registers) -> u16 {
    r.get(i.base_r_number()).wrapping_add(i.pc_offset(6))
}
