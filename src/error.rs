use std::fmt;

use thiserror::Error;

use crate::memory::Word;

/// Direction in which the stack pointer tried to leave the stack region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackFaultKind {
    /// A push with no free slot left below SP
    Overflow,
    /// A pop from an empty stack
    Underflow,
}

impl fmt::Display for StackFaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackFaultKind::Overflow => f.write_str("overflow"),
            StackFaultKind::Underflow => f.write_str("underflow"),
        }
    }
}

/// Everything that can stop the machine.
///
/// Once a fault is raised by [`Machine::execute`](crate::Machine::execute) the
/// machine stays faulted until it is reset or a new program is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Fault {
    #[error("memory has no address `0x{address:x}`")]
    OutOfBounds { address: usize },

    #[error("invalid opcode `0x{opcode:04x}` at `0x{address:04x}`")]
    InvalidOpcode { opcode: Word, address: Word },

    #[error("invalid register `0x{index:x}`")]
    InvalidRegister { index: Word },

    #[error("invalid peripheral port `{port}`")]
    InvalidPort { port: Word },

    #[error("stack {kind} with SP at `0x{sp:04x}`")]
    StackFault { kind: StackFaultKind, sp: Word },

    #[error("division by zero in `{mnemonic}`")]
    ArithmeticFault { mnemonic: &'static str },

    #[error("program of {len} words does not fit at base `0x{base:04x}`")]
    ProgramTooLarge { base: usize, len: usize },
}

pub type Result<T, E = Fault> = std::result::Result<T, E>;
