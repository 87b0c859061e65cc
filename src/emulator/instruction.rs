use std::fmt::{Debug, Formatter};

/// One 16 bit instruction word.
///
/// Bits 15..=12 carry the opcode; the remaining twelve bits are operand
/// fields whose layout depends on the opcode. Decoding never fails: every
/// `u16` has a well defined field breakdown.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Instruction(u16);

impl Instruction {
    /// Value of bits `from..=to`, shifted down to start at bit zero.
    ///
    /// # Panics
    /// Debug builds assert the range is well formed and inside a `u16`.
    #[must_use]
    pub fn get_bit_range(self, from: u8, to: u8) -> u16 {
        debug_assert!(from <= to, "bit range runs backwards: {from}..={to}");
        debug_assert!(to < 16, "bit index {to} outside a 16 bit word");
        let width = to - from + 1;
        (self.0 >> from) & (u16::MAX >> (16 - width))
    }

    /// [`Self::get_bit_range`] narrowed to `u8`, for fields of at most eight
    /// bits.
    ///
    /// # Panics
    /// When the requested range is wider than eight bits.
    #[must_use]
    pub fn get_bit_range_u8(self, from: u8, to: u8) -> u8 {
        u8::try_from(self.get_bit_range(from, to)).expect("bit range wider than eight bits")
    }

    #[must_use]
    pub fn get_bit(self, index: u8) -> bool {
        self.get_bit_range(index, index) == 1
    }

    /// The 4 bit opcode field.
    #[must_use]
    pub fn op_code(self) -> u8 {
        self.get_bit_range_u8(12, 15)
    }

    /// Destination register number (bits 11..=9); the same bits name the
    /// source register of ST, STI and STR.
    #[must_use]
    pub fn dr_number(self) -> u8 {
        self.get_bit_range_u8(9, 11)
    }

    /// First source register number (bits 8..=6).
    #[must_use]
    pub fn sr1_number(self) -> u8 {
        self.get_bit_range_u8(6, 8)
    }

    /// Second source register number (bits 2..=0) of register-mode ADD/AND.
    #[must_use]
    pub fn sr2_number(self) -> u8 {
        self.get_bit_range_u8(0, 2)
    }

    /// Base register number (bits 8..=6) of JMP, JSRR, LDR and STR.
    #[must_use]
    pub fn base_r_number(self) -> u8 {
        self.get_bit_range_u8(6, 8)
    }

    /// Immediate-mode bit of ADD and AND.
    #[must_use]
    pub fn is_immediate(self) -> bool {
        self.get_bit(5)
    }

    /// The 5 bit immediate, sign extended to a full word.
    #[must_use]
    pub fn imm5(self) -> u16 {
        Self::sign_extend(self.get_bit_range(0, 4), 5)
    }

    /// Condition mask of BR (bits 11..=9, the n/z/p bits).
    #[must_use]
    pub fn condition_mask(self) -> u16 {
        self.get_bit_range(9, 11)
    }

    /// Bit 11 of JSR: set for the PC-relative long form, clear for JSRR.
    #[must_use]
    pub fn is_long_jump(self) -> bool {
        self.get_bit(11)
    }

    /// The 8 bit trap vector.
    #[must_use]
    pub fn trap_vector(self) -> u8 {
        self.get_bit_range_u8(0, 7)
    }

    /// The trailing offset field, `len` bits wide, sign extended for
    /// wrapping address arithmetic.
    #[must_use]
    pub fn pc_offset(self, len: u8) -> u16 {
        Self::sign_extend(self.get_bit_range(0, len - 1), len)
    }

    /// Replicates the top bit of a `valid_bits` wide field into every higher
    /// bit of the word. `bits` must not exceed the field width.
    const fn sign_extend(bits: u16, valid_bits: u8) -> u16 {
        if bits >> (valid_bits - 1) == 1 {
            bits | (u16::MAX << valid_bits)
        } else {
            bits
        }
    }
}

impl From<u16> for Instruction {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instruction {{ raw: {:#06X}, op: {:04b}, dr: {}, sr1: {} }}",
            self.0,
            self.op_code(),
            self.dr_number(),
            self.sr1_number(),
        )
    }
}

#[expect(clippy::unusual_byte_groupings)]
#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use yare::parameterized;

    #[parameterized(
        imm5 = { 5 },
        offset6 = { 6 },
        offset9 = { 9 },
        offset11 = { 11 }
    )]
    pub fn sign_extend_round_trips_the_low_bits(width: u8) {
        let field_mask = (1u16 << width) - 1;
        for raw in 0..=field_mask {
            let extended = Instruction::sign_extend(raw, width);
            assert_eq!(extended & field_mask, raw, "low bits changed for {raw:#06X}");
            let high = extended >> width;
            let expected_high = if raw >> (width - 1) == 1 {
                u16::MAX >> width
            } else {
                0
            };
            assert_eq!(high, expected_high, "high bits wrong for {raw:#06X}");
        }
    }

    #[gtest]
    pub fn test_register_mode_add_fields() {
        // ADD: DR 3, SR1 2, register mode, SR2 1
        let sut = Instruction::from(0b0001_011_010_0_00_001);
        expect_that!(sut.op_code(), eq(1));
        expect_that!(sut.dr_number(), eq(3));
        expect_that!(sut.sr1_number(), eq(2));
        expect_that!(sut.sr2_number(), eq(1));
        expect_that!(sut.is_immediate(), eq(false));
    }

    #[gtest]
    pub fn test_immediate_mode_add_fields() {
        // ADD: DR 7, SR1 0, immediate mode, imm5 -2
        let sut = Instruction::from(0b0001_111_000_1_11110);
        expect_that!(sut.op_code(), eq(1));
        expect_that!(sut.dr_number(), eq(7));
        expect_that!(sut.sr1_number(), eq(0));
        expect_that!(sut.is_immediate(), eq(true));
        expect_that!(sut.imm5(), eq(0xFFFE));
    }

    #[gtest]
    pub fn test_branch_fields() {
        // BRnp with a negative 9 bit offset
        let sut = Instruction::from(0b0000_101_111111100);
        expect_that!(sut.op_code(), eq(0));
        expect_that!(sut.condition_mask(), eq(0b101));
        expect_that!(sut.pc_offset(9), eq(0xFFFC));
    }

    #[gtest]
    pub fn test_jump_subroutine_fields() {
        // JSR long form, positive 11 bit offset
        let long = Instruction::from(0b0100_1_00110100001);
        expect_that!(long.is_long_jump(), eq(true));
        expect_that!(long.pc_offset(11), eq(0b001_1010_0001));
        // JSRR through base register 6
        let via_register = Instruction::from(0b0100_000_110_000000);
        expect_that!(via_register.is_long_jump(), eq(false));
        expect_that!(via_register.base_r_number(), eq(6));
    }

    #[gtest]
    pub fn test_trap_vector_field() {
        let sut = Instruction::from(0xF025);
        expect_that!(sut.op_code(), eq(0b1111));
        expect_that!(sut.trap_vector(), eq(0x25));
    }

    #[gtest]
    pub fn test_full_width_bit_range() {
        let sut = Instruction::from(0xA5C3);
        expect_that!(sut.get_bit_range(0, 15), eq(0xA5C3));
        expect_that!(sut.get_bit(15), eq(true));
        expect_that!(sut.get_bit(14), eq(false));
    }

    #[gtest]
    #[should_panic(expected = "bit range runs backwards: 2..=1")]
    pub fn test_bit_range_rejects_backwards_range() {
        let _ = Instruction::from(0).get_bit_range(2, 1);
    }

    #[gtest]
    #[should_panic(expected = "bit index 16 outside a 16 bit word")]
    pub fn test_bit_range_rejects_out_of_word_index() {
        let _ = Instruction::from(0).get_bit_range(3, 16);
    }
}
