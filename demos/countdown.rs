use color_eyre::eyre::Result;

use log::LevelFilter;
use simple_logger::SimpleLogger;
use virt16::processor::Instruction::*;
use virt16::registers::Register::*;
use virt16::{EngineState, Machine, Word};

/// The main entrypoint. First instruction should be placed here.
const ENTRYPOINT: Word = 0x0000;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()?; // logging

    // counts R1 down from 10, writing every value to port P1
    let program = [
        LDI as Word, R1 as Word, 10, // 0x00
        OUT as Word, 0, R1 as Word,  // 0x03: loop
        DEC as Word, R1 as Word,     // 0x06
        JNZ as Word, 0x03,           // 0x08
        OUT as Word, 0, R1 as Word,  // 0x0A
        HALT as Word,                // 0x0D
    ];

    let mut machine = Machine::new();
    machine.load_program(&program, ENTRYPOINT)?;

    // step one instruction at a time, the way an interactive driver would
    let mut last = None;
    while machine.execute()? == EngineState::Running {
        let out = machine.ports()[0];
        if last != Some(out) {
            log::info!("{}", out);
            last = Some(out);
        }
    }

    log::info!(
        "Program terminated after {} instructions",
        machine.step_count()
    );

    Ok(())
}
