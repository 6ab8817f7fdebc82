use color_eyre::eyre::Result;

use simple_logger::SimpleLogger;
use virt16::processor::Instruction::*;
use virt16::registers::Register::*;
use virt16::{Machine, Word};

/// The main entrypoint. First instruction should be placed here.
const ENTRYPOINT: Word = 0x0100;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().init()?; // logging

    let program = [
        LDI as Word, R1 as Word, 42,
        LDI as Word, R2 as Word, 58,
        ADD as Word, R1 as Word, R2 as Word,
        HALT as Word,
    ];

    let mut machine = Machine::new();
    machine.load_program(&program, ENTRYPOINT)?;
    machine.run(100)?;

    log::info!(
        "Program terminated. Result: 0x{:04X} / {}",
        machine.accumulator(),
        machine.accumulator()
    );

    Ok(())
}
