use log::*;

use crate::error::{Fault, Result};
use crate::memory::{Memory, Word};
use crate::peripherals::Peripherals;
use crate::registers::{Flags, Register, Registers};
use crate::stack::{self, STACK_TOP};

mod decode;
mod instruction;

pub use decode::{decode, Decoded, Operand, MAX_OPERANDS};
pub use instruction::{Instruction, OperandKind};


/// Whether the processor will dispatch further instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    Running,
    /// Stopped by `HALT`
    Halted,
    /// Stopped by a fault, see [`Processor::last_fault`]
    Faulted,
}

impl Default for EngineState {
    /// A machine with no program loaded does not run
    fn default() -> Self {
        EngineState::Halted
    }
}

/// Emulates the CPU: registers, flags, program counter and stack pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Processor {
    /// Program counter
    pc: Word,
    /// Stack pointer
    sp: Word,
    registers: Registers,
    flags: Flags,
    state: EngineState,
    /// The fault that stopped the processor, if any
    fault: Option<Fault>,
    /// Instructions executed since the processor was created
    steps: u64,
}

impl Processor {
    /// Initializes a running CPU
    /// @param entrypoint The start of the program
    pub fn new(entrypoint: Word) -> Self {
        Self {
            pc: entrypoint,
            sp: STACK_TOP,
            state: EngineState::Running,
            ..Self::default()
        }
    }

    /// Program counter
    pub fn pc(&self) -> Word {
        self.pc
    }

    /// Stack pointer
    pub fn sp(&self) -> Word {
        self.sp
    }

    /// General purpose registers and the accumulator
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Condition flags set by the last comparison or arithmetic instruction
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Whether the processor is running, halted or faulted
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The fault that stopped the processor, if any
    pub fn last_fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Instructions executed since the processor was created
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Runs one execution step.
    ///
    /// Does nothing unless the processor is running. A fault moves the processor
    /// to [`EngineState::Faulted`] and is returned; the faulting instruction
    /// leaves no trace in the machine state.
    pub fn execute(&mut self, memory: &mut Memory, bus: &mut Peripherals) -> Result<EngineState> {
        if self.state != EngineState::Running {
            return Ok(self.state);
        }

        match self.step(memory, bus) {
            Ok(()) => Ok(self.state),
            Err(fault) => {
                warn!("Fault at 0x{:04X}: {}", self.pc, fault);
                self.state = EngineState::Faulted;
                self.fault = Some(fault);
                Err(fault)
            }
        }
    }

    fn step(&mut self, memory: &mut Memory, bus: &mut Peripherals) -> Result<()> {
        let decoded = decode(memory, self.pc)?;
        debug!("0x{:04X}: {}", self.pc, decoded);

        let next = self.pc + decoded.length();
        self.pc = self
            .execute_instruction(&decoded, memory, bus)?
            .unwrap_or(next);

        bus.tick();
        self.steps += 1;
        Ok(())
    }

    /// Executes a single decoded instruction.
    ///
    /// Every handler checks everything that can fail before it changes any
    /// state. Returns the jump target if the instruction transfers control.
    pub fn execute_instruction(
        &mut self,
        decoded: &Decoded,
        memory: &mut Memory,
        bus: &mut Peripherals,
    ) -> Result<Option<Word>> {
        use Instruction::*;
        use Operand::*;

        let return_address = self.pc + decoded.length();

        match (decoded.instruction, decoded.operands()) {
            (NOP, []) => {}
            (HALT, []) => {
                self.state = EngineState::Halted;
                debug!("HALT");
            }

            // data movement
            (LDI, &[Reg(dst), Imm(value)]) => {
                self.write_register(dst, value, bus)?;
            }
            (LD, &[Reg(dst), Addr(address)]) => {
                let value = memory.read(address)?;
                self.write_register(dst, value, bus)?;
            }
            (LDR, &[Reg(dst), Reg(src)]) => {
                let address = self.read_register(src, bus)?;
                let value = memory.read(address)?;
                self.write_register(dst, value, bus)?;
            }
            (ST, &[Addr(address), Reg(src)]) => {
                let value = self.read_register(src, bus)?;
                memory.write(address, value)?;
            }
            (STR, &[Reg(dst), Reg(src)]) => {
                let address = self.read_register(dst, bus)?;
                let value = self.read_register(src, bus)?;
                memory.write(address, value)?;
            }
            (MOV, &[Reg(dst), Reg(src)]) => {
                let value = self.read_register(src, bus)?;
                self.write_register(dst, value, bus)?;
            }

            // arithmetic and logic, the result always lands in A
            (NOT, &[Reg(a)]) => {
                let value = self.read_register(a, bus)?;
                self.set_result(!value);
            }
            (instruction, &[Reg(a), Reg(b)]) if is_binary_alu(instruction) => {
                let a = self.read_register(a, bus)?;
                let b = self.read_register(b, bus)?;
                let result = self.alu(instruction, a, b)?;
                self.set_result(result);

                debug!("{} {} {}: {}", instruction, a, b, result);
            }
            (INC, &[Reg(r)]) => {
                let value = self.read_register(r, bus)?.wrapping_add(1);
                self.write_register(r, value, bus)?;
                self.flags.test_result(value);
            }
            (DEC, &[Reg(r)]) => {
                let value = self.read_register(r, bus)?.wrapping_sub(1);
                self.write_register(r, value, bus)?;
                self.flags.test_result(value);
            }

            // comparison
            (CMP, &[Reg(a), Reg(b)]) => {
                let a = self.read_register(a, bus)?;
                let b = self.read_register(b, bus)?;
                self.flags.compare(a, b);
            }
            (CMPI, &[Reg(a), Imm(b)]) => {
                let a = self.read_register(a, bus)?;
                self.flags.compare(a, b);
            }

            // control flow
            (JMP, &[Addr(address)]) => return Ok(Some(address)),
            (JZ, &[Addr(address)]) => return Ok(Some(address).filter(|_| self.flags.z)),
            (JNZ, &[Addr(address)]) => return Ok(Some(address).filter(|_| !self.flags.z)),
            (JE, &[Addr(address)]) => return Ok(Some(address).filter(|_| self.flags.e)),
            (JNE, &[Addr(address)]) => return Ok(Some(address).filter(|_| !self.flags.e)),
            (JG, &[Addr(address)]) => return Ok(Some(address).filter(|_| self.flags.g)),
            (JL, &[Addr(address)]) => return Ok(Some(address).filter(|_| self.flags.l)),
            (CALL, &[Addr(address)]) => {
                stack::push(memory, &mut self.sp, return_address)?;
                return Ok(Some(address));
            }
            (RET, []) => {
                let address = stack::pop(memory, &mut self.sp)?;
                return Ok(Some(address));
            }

            // stack
            (PUSH, &[Reg(src)]) => {
                let value = self.read_register(src, bus)?;
                stack::push(memory, &mut self.sp, value)?;
            }
            (POP, &[Reg(dst)]) => {
                let value = stack::pop(memory, &mut self.sp)?;
                self.write_register(dst, value, bus)?;
            }

            // I/O
            (IN, &[Reg(dst), Port(port)]) => {
                let value = bus.port(port)?;
                self.write_register(dst, value, bus)?;
            }
            (OUT, &[Port(port), Reg(src)]) => {
                let value = self.read_register(src, bus)?;
                bus.set_port(port, value)?;
                debug!("OUT P{}: {}", port + 1, value);
            }

            // the decoder only produces operand layouts from the instruction table
            (instruction, _) => {
                return Err(Fault::InvalidOpcode {
                    opcode: instruction.into(),
                    address: self.pc,
                })
            }
        }

        Ok(None)
    }

    fn set_result(&mut self, value: Word) {
        self.registers.set_accumulator(value);
        self.flags.test_result(value);
    }

    /// Reads any register-mapped slot
    fn read_register(&self, register: Register, bus: &Peripherals) -> Result<Word> {
        match register {
            Register::SP => Ok(self.sp),
            Register::DISP => Ok(bus.video()),
            Register::TIME => Ok(bus.time()),
            Register::A => Ok(self.registers.accumulator()),
            Register::P1 | Register::P2 | Register::P3 | Register::P4 => {
                bus.port(Self::port_of(register)?)
            }
            _ => self.registers.get(Self::index_of(register)?),
        }
    }

    /// Writes any register-mapped slot
    fn write_register(
        &mut self,
        register: Register,
        value: Word,
        bus: &mut Peripherals,
    ) -> Result<()> {
        match register {
            Register::SP => self.sp = value,
            Register::DISP => bus.set_video(value),
            Register::TIME => bus.set_time(value),
            Register::A => self.registers.set_accumulator(value),
            Register::P1 | Register::P2 | Register::P3 | Register::P4 => {
                bus.set_port(Self::port_of(register)?, value)?
            }
            _ => self.registers.set(Self::index_of(register)?, value)?,
        }

        Ok(())
    }

    fn port_of(register: Register) -> Result<Word> {
        register.port().ok_or(Fault::InvalidPort {
            port: register.into(),
        })
    }

    fn index_of(register: Register) -> Result<Word> {
        register.general_index().ok_or(Fault::InvalidRegister {
            index: register.into(),
        })
    }

    /// Computes a two-operand arithmetic or logic instruction
    fn alu(&self, instruction: Instruction, a: Word, b: Word) -> Result<Word> {
        use Instruction::*;

        let result = match instruction {
            ADD => a.wrapping_add(b),
            SUB => a.wrapping_sub(b),
            MUL => a.wrapping_mul(b),
            DIV | MOD if b == 0 => {
                return Err(Fault::ArithmeticFault {
                    mnemonic: instruction.name(),
                })
            }
            DIV => a / b,
            MOD => a % b,
            AND => a & b,
            OR => a | b,
            XOR => a ^ b,
            SHL => a << (b % 16),
            SHR => a >> (b % 16),
            _ => {
                return Err(Fault::InvalidOpcode {
                    opcode: instruction.into(),
                    address: self.pc,
                })
            }
        };

        Ok(result)
    }
}

fn is_binary_alu(instruction: Instruction) -> bool {
    use Instruction::*;

    matches!(
        instruction,
        ADD | SUB | MUL | DIV | MOD | AND | OR | XOR | SHL | SHR
    )
}
