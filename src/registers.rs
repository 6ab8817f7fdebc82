use std::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{Fault, Result};
use crate::memory::Word;

/// Number of general purpose registers (R1..R15)
pub const REGISTER_COUNT: usize = 15;

/// A register operand as it is encoded in an instruction.
///
/// Besides the general purpose registers this also names the register-mapped
/// parts of the machine, so that `MOV R1, TIME` or `MOV DISP, R2` need no
/// dedicated instructions.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(TryFromPrimitive, IntoPrimitive)]
pub enum Register {
    R1 = 0x01,
    R2 = 0x02,
    R3 = 0x03,
    R4 = 0x04,
    R5 = 0x05,
    R6 = 0x06,
    R7 = 0x07,
    R8 = 0x08,
    R9 = 0x09,
    R10 = 0x0A,
    R11 = 0x0B,
    R12 = 0x0C,
    R13 = 0x0D,
    R14 = 0x0E,
    R15 = 0x0F,
    /// Stack pointer
    SP = 0x10,
    /// Display base address
    DISP = 0x11,
    /// Tick counter
    TIME = 0x12,
    /// Accumulator
    A = 0x13,
    P1 = 0x14,
    P2 = 0x15,
    P3 = 0x16,
    P4 = 0x17,
}

impl Register {
    /// Decodes a register operand
    pub fn from_code(code: Word) -> Result<Self> {
        Register::try_from(code).map_err(|_| Fault::InvalidRegister { index: code })
    }

    /// The index into the general purpose registers, if this is one of them
    pub fn general_index(self) -> Option<Word> {
        let code = Word::from(self);
        if (1..=REGISTER_COUNT as Word).contains(&code) {
            Some(code)
        } else {
            None
        }
    }

    /// The peripheral port this register maps to, if any
    pub fn port(self) -> Option<Word> {
        match self {
            Register::P1 => Some(0),
            Register::P2 => Some(1),
            Register::P3 => Some(2),
            Register::P4 => Some(3),
            _ => None,
        }
    }
}

/// The general purpose registers and the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Registers {
    general: [Word; REGISTER_COUNT],
    accumulator: Word,
}

impl Registers {
    fn slot(index: Word) -> Result<usize> {
        if (1..=REGISTER_COUNT as Word).contains(&index) {
            Ok(index as usize - 1)
        } else {
            Err(Fault::InvalidRegister { index })
        }
    }

    /// Reads general purpose register `index` (1..=15)
    pub fn get(&self, index: Word) -> Result<Word> {
        Ok(self.general[Self::slot(index)?])
    }

    /// Writes general purpose register `index` (1..=15)
    pub fn set(&mut self, index: Word, value: Word) -> Result<()> {
        self.general[Self::slot(index)?] = value;
        Ok(())
    }

    /// The accumulator A
    pub fn accumulator(&self) -> Word {
        self.accumulator
    }

    /// Writes the accumulator A
    pub fn set_accumulator(&mut self, value: Word) {
        self.accumulator = value;
    }

    /// R1..R15 in order
    pub fn general(&self) -> &[Word; REGISTER_COUNT] {
        &self.general
    }
}

/// Condition flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags {
    /// Zero
    pub z: bool,
    /// Greater
    pub g: bool,
    /// Less
    pub l: bool,
    /// Equal
    pub e: bool,
}

impl Flags {
    /// Sets the flags as `CMP a, b` does.
    ///
    /// Exactly one of G, L and E ends up set. Z tests the difference `a - b`.
    pub fn compare(&mut self, a: Word, b: Word) {
        self.g = a > b;
        self.l = a < b;
        self.e = a == b;
        self.z = a.wrapping_sub(b) == 0;
    }

    /// Sets the flags for an arithmetic or logic result, i.e. compares it against zero
    pub fn test_result(&mut self, value: Word) {
        self.compare(value, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_registers_start_zeroed() {
        let regs = Registers::default();
        assert_eq!(regs.general(), &[0; REGISTER_COUNT]);
        assert_eq!(regs.accumulator(), 0);
    }

    #[test]
    fn test_set_and_get() -> Result<()> {
        let mut regs = Registers::default();
        regs.set(1, 0xAAAA)?;
        regs.set(15, 0x5555)?;

        assert_eq!(regs.get(1)?, 0xAAAA);
        assert_eq!(regs.get(15)?, 0x5555);
        assert_eq!(regs.get(2)?, 0);

        Ok(())
    }

    #[test]
    fn test_invalid_register() {
        let mut regs = Registers::default();
        assert_eq!(regs.get(0), Err(Fault::InvalidRegister { index: 0 }));
        assert_eq!(regs.set(16, 1), Err(Fault::InvalidRegister { index: 16 }));
    }

    #[test]
    fn test_register_codes() -> Result<()> {
        assert_eq!(Register::from_code(0x01)?, Register::R1);
        assert_eq!(Register::from_code(0x13)?, Register::A);
        assert_eq!(Register::from_code(0x17)?, Register::P4);
        assert_eq!(
            Register::from_code(0x00),
            Err(Fault::InvalidRegister { index: 0 })
        );
        assert_eq!(
            Register::from_code(0x18),
            Err(Fault::InvalidRegister { index: 0x18 })
        );

        assert_eq!(Register::R15.general_index(), Some(15));
        assert_eq!(Register::A.general_index(), None);
        assert_eq!(Register::P3.port(), Some(2));
        assert_eq!(Register::R3.port(), None);

        Ok(())
    }

    #[test]
    fn test_compare_greater() {
        let mut flags = Flags::default();
        flags.compare(5, 3);
        assert!(flags.g);
        assert!(!flags.l);
        assert!(!flags.e);
        assert!(!flags.z);
    }

    #[test]
    fn test_compare_equal() {
        let mut flags = Flags::default();
        flags.compare(3, 3);
        assert!(flags.e);
        assert!(!flags.g);
        assert!(!flags.l);
        assert!(flags.z);
    }

    #[test]
    fn test_compare_less() {
        let mut flags = Flags::default();
        flags.compare(0, 0xFFFF);
        assert!(flags.l);
        assert!(!flags.g);
        assert!(!flags.e);
        assert!(!flags.z);
    }

    #[test]
    fn test_result_flags() {
        let mut flags = Flags::default();
        flags.test_result(0);
        assert_eq!(
            flags,
            Flags {
                z: true,
                g: false,
                l: false,
                e: true
            }
        );

        flags.test_result(42);
        assert_eq!(
            flags,
            Flags {
                z: false,
                g: true,
                l: false,
                e: false
            }
        );
    }
}
