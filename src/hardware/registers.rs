/// Address of the first instruction after reset.
pub const PROGRAM_START: u16 = 0x3000;

/// The architectural register state: eight general purpose registers, the
/// program counter and the condition flag register.
///
/// All arithmetic on register values is modulo 2^16; the machine has no
/// overflow traps.
#[derive(Debug)]
pub struct Registers {
    general_purpose: [u16; 8],
    pc: u16,
    cond: ConditionFlag,
}

impl Registers {
    /// Registers in the reset state: everything zero, the program counter at
    /// [`PROGRAM_START`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            general_purpose: [0; 8],
            pc: PROGRAM_START,
            cond: ConditionFlag::Zero,
        }
    }

    /// Value of general purpose register `r`.
    ///
    /// # Panics
    /// When `r` is not a valid register number. Callers decode `r` from 3 bit
    /// instruction fields, which cannot produce one.
    #[must_use]
    pub fn get(&self, r: u8) -> u16 {
        assert!(r <= 7, "register number out of range: {r}");
        self.general_purpose[usize::from(r)]
    }

    /// Stores `value` in general purpose register `r`.
    ///
    /// # Panics
    /// When `r` is not a valid register number, as for [`Self::get`].
    pub fn set(&mut self, r: u8, value: u16) {
        assert!(r <= 7, "register number out of range: {r}");
        self.general_purpose[usize::from(r)] = value;
    }

    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    pub const fn set_pc(&mut self, address: u16) {
        self.pc = address;
    }

    /// Moves the program counter past the word just fetched.
    pub const fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(1);
    }

    #[must_use]
    pub const fn condition_flag(&self) -> ConditionFlag {
        self.cond
    }

    /// Recomputes the condition flag from the current value of register `r`.
    ///
    /// # Panics
    /// When `r` is not a valid register number, as for [`Self::get`].
    pub fn update_condition_flags(&mut self, r: u8) {
        self.cond = ConditionFlag::from(self.get(r));
    }

    /// Returns every register to the reset state, leaving memory alone, so a
    /// loaded image can run again.
    pub const fn reset(&mut self) {
        self.general_purpose = [0; 8];
        self.pc = PROGRAM_START;
        self.cond = ConditionFlag::Zero;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Condition codes, reflecting the sign of the last flag-updating result.
///
/// Exactly one is in effect at any time; the discriminants are the bits the
/// BR instruction masks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFlag {
    /// Positive when read as a signed word.
    Pos = 1 << 0,
    /// Zero.
    Zero = 1 << 1,
    /// Sign bit set.
    Neg = 1 << 2,
}

impl ConditionFlag {
    /// The flag as a bit for masking against a BR condition field.
    #[must_use]
    pub const fn mask_bit(self) -> u16 {
        self as u16
    }
}

impl From<u16> for ConditionFlag {
    fn from(value: u16) -> Self {
        if value == 0 {
            Self::Zero
        } else if value >> 15 == 1 {
            Self::Neg
        } else {
            Self::Pos
        }
    }
}
