//! A deterministic interpreter for a small 16-bit virtual machine.
//!
//! The machine has 32768 words of memory, fifteen general purpose registers
//! plus an accumulator, four condition flags, a stack at the top of memory and
//! a handful of register-mapped peripherals (four I/O ports, a display base
//! address and a tick counter).
//!
//! A driver owns a [`Machine`], loads a program image into it and calls
//! [`Machine::execute`] once per step, inspecting the state in between:
//!
//! ```
//! use virt16::processor::Instruction::*;
//! use virt16::registers::Register::*;
//! use virt16::{EngineState, Machine, Word};
//!
//! let program = [
//!     LDI as Word, R1 as Word, 5,
//!     LDI as Word, R2 as Word, 3,
//!     ADD as Word, R1 as Word, R2 as Word,
//!     HALT as Word,
//! ];
//!
//! let mut machine = Machine::new();
//! machine.load_program(&program, 0).unwrap();
//! assert_eq!(machine.run(100).unwrap(), EngineState::Halted);
//! assert_eq!(machine.accumulator(), 8);
//! ```

pub mod error;
pub mod machine;
pub mod memory;
pub mod peripherals;
pub mod processor;
pub mod registers;
pub mod stack;

pub use error::{Fault, StackFaultKind};
pub use machine::Machine;
pub use memory::{Byte, Word, MEMORY_SIZE};
pub use processor::{EngineState, Instruction};
