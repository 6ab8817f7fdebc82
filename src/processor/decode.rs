use std::convert::TryFrom;
use std::fmt;

use crate::error::{Fault, Result};
use crate::memory::{Memory, Word, MEMORY_SIZE};
use crate::peripherals::PORT_COUNT;
use crate::registers::Register;

use super::instruction::{Instruction, OperandKind};

/// The most operands any instruction takes
pub const MAX_OPERANDS: usize = 2;

/// A validated operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Reg(Register),
    Imm(Word),
    Addr(Word),
    Port(Word),
}

impl Operand {
    fn parse(kind: OperandKind, word: Word) -> Result<Self> {
        match kind {
            OperandKind::Reg => Register::from_code(word).map(Operand::Reg),
            OperandKind::Imm => Ok(Operand::Imm(word)),
            OperandKind::Addr if (word as usize) < MEMORY_SIZE => Ok(Operand::Addr(word)),
            OperandKind::Addr => Err(Fault::OutOfBounds {
                address: word as usize,
            }),
            OperandKind::Port if (word as usize) < PORT_COUNT => Ok(Operand::Port(word)),
            OperandKind::Port => Err(Fault::InvalidPort { port: word }),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(register) => write!(f, "{:?}", register),
            Operand::Imm(value) => write!(f, "#{}", value),
            Operand::Addr(address) => write!(f, "0x{:04X}", address),
            Operand::Port(port) => write!(f, "P{}", port + 1),
        }
    }
}

/// An instruction together with its operands, as found at some address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decoded {
    pub instruction: Instruction,
    operands: [Operand; MAX_OPERANDS],
    count: usize,
}

impl Decoded {
    pub fn operands(&self) -> &[Operand] {
        &self.operands[..self.count]
    }

    /// Number of words the instruction occupies
    pub fn length(&self) -> Word {
        self.instruction.length() as Word
    }
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instruction)?;
        for (i, operand) in self.operands().iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, operand)?;
        }
        Ok(())
    }
}

/// Decodes the instruction starting at `pc`.
///
/// Operands are validated here, so a decoded instruction never refers to a
/// register, port or address that does not exist.
pub fn decode(memory: &Memory, pc: Word) -> Result<Decoded> {
    let opcode = memory.read(pc)?;
    let instruction = Instruction::try_from(opcode).map_err(|_| Fault::InvalidOpcode {
        opcode,
        address: pc,
    })?;

    let mut operands = [Operand::Imm(0); MAX_OPERANDS];
    let kinds = instruction.operands();
    for (i, kind) in kinds.iter().enumerate() {
        // pc is below MEMORY_SIZE here, so this cannot overflow
        let word = memory.read(pc + 1 + i as Word)?;
        operands[i] = Operand::parse(*kind, word)?;
    }

    Ok(Decoded {
        instruction,
        operands,
        count: kinds.len(),
    })
}
