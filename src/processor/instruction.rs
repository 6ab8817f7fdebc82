use num_enum::{IntoPrimitive, TryFromPrimitive};

/// How an operand word following the opcode is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// A register operand code, see [`Register`](crate::registers::Register)
    Reg,
    /// A literal word
    Imm,
    /// A memory address
    Addr,
    /// A peripheral port number
    Port,
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal ( $( $kind:ident ),* ) , )+ ) => {
        /// Defines the instructions.
        ///
        /// Every instruction is an opcode word followed by one word per operand.
        #[repr(u16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }

            /// The operand layout following the opcode
            pub fn operands(&self) -> &'static [OperandKind] {
                match self {
                    $( Self::$name => &[ $( OperandKind::$kind ),* ] , )+
                }
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

impl Instruction {
    /// Number of words the instruction occupies, opcode included
    pub fn length(&self) -> usize {
        1 + self.operands().len()
    }
}

instructions! {
    /// No operation
    NOP = 0x00 (),
    /// Load an immediate value into a register
    LDI = 0x01 (Reg, Imm),
    /// Load a word from a memory address into a register
    LD = 0x02 (Reg, Addr),
    /// Load a word from the memory address held in the second register
    LDR = 0x03 (Reg, Reg),
    /// Store a register at a memory address
    ST = 0x04 (Addr, Reg),
    /// Store the second register at the memory address held in the first
    STR = 0x05 (Reg, Reg),
    /// Copy the second register into the first
    MOV = 0x06 (Reg, Reg),
    /// A = a + b
    ADD = 0x10 (Reg, Reg),
    /// A = a - b
    SUB = 0x11 (Reg, Reg),
    /// A = a * b
    MUL = 0x12 (Reg, Reg),
    /// A = a / b, faults on a zero divisor
    DIV = 0x13 (Reg, Reg),
    /// A = a % b, faults on a zero divisor
    MOD = 0x14 (Reg, Reg),
    /// A = a & b
    AND = 0x15 (Reg, Reg),
    /// A = a | b
    OR = 0x16 (Reg, Reg),
    /// A = a ^ b
    XOR = 0x17 (Reg, Reg),
    /// A = !a
    NOT = 0x18 (Reg),
    /// A = a << b
    SHL = 0x19 (Reg, Reg),
    /// A = a >> b
    SHR = 0x1A (Reg, Reg),
    /// Increment a register in place
    INC = 0x1B (Reg),
    /// Decrement a register in place
    DEC = 0x1C (Reg),
    /// Compare two registers
    CMP = 0x20 (Reg, Reg),
    /// Compare a register with an immediate value
    CMPI = 0x21 (Reg, Imm),
    /// Jump to an address
    JMP = 0x30 (Addr),
    /// Jump if the zero flag is set
    JZ = 0x31 (Addr),
    /// Jump if the zero flag is clear
    JNZ = 0x32 (Addr),
    /// Jump if equal
    JE = 0x33 (Addr),
    /// Jump if not equal
    JNE = 0x34 (Addr),
    /// Jump if greater
    JG = 0x35 (Addr),
    /// Jump if less
    JL = 0x36 (Addr),
    /// Push the return address and jump to a subroutine
    CALL = 0x37 (Addr),
    /// Return from a subroutine
    RET = 0x38 (),
    /// Push a register onto the stack
    PUSH = 0x40 (Reg),
    /// Pop the stack into a register
    POP = 0x41 (Reg),
    /// Read a peripheral port into a register
    IN = 0x50 (Reg, Port),
    /// Write a register to a peripheral port
    OUT = 0x51 (Port, Reg),
    /// Stop the machine
    HALT = 0xFF (),
}
