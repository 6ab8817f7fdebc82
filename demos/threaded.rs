//! Steps the machine on a background thread at a fixed tick rate while the
//! main thread watches it, with the whole machine behind one mutex.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use virt16::processor::Instruction::*;
use virt16::registers::Register::*;
use virt16::{EngineState, Machine, Word};

const TICK: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()?; // logging

    // sums 1..=100 into R2
    let program = [
        LDI as Word, R1 as Word, 100, // 0x00
        LDI as Word, R2 as Word, 0,   // 0x03
        ADD as Word, R2 as Word, R1 as Word, // 0x06: loop
        MOV as Word, R2 as Word, A as Word,  // 0x09
        DEC as Word, R1 as Word,      // 0x0C
        JNZ as Word, 0x06,            // 0x0E
        HALT as Word,                 // 0x10
    ];

    let mut machine = Machine::new();
    machine.load_program(&program, 0)?;
    let machine = Arc::new(Mutex::new(machine));

    let stepper = {
        let machine = Arc::clone(&machine);
        thread::spawn(move || -> Result<EngineState> {
            loop {
                let state = machine
                    .lock()
                    .map_err(|_| eyre!("machine lock poisoned"))?
                    .execute()?;
                if state != EngineState::Running {
                    return Ok(state);
                }
                thread::sleep(TICK);
            }
        })
    };

    while !stepper.is_finished() {
        {
            let machine = machine.lock().map_err(|_| eyre!("machine lock poisoned"))?;
            log::info!(
                "PC: 0x{:04X}  R1: {:3}  R2: {:5}",
                machine.pc(),
                machine.registers()[0],
                machine.registers()[1]
            );
        }
        thread::sleep(TICK * 20);
    }

    let state = stepper
        .join()
        .map_err(|_| eyre!("stepping thread panicked"))??;
    let machine = machine.lock().map_err(|_| eyre!("machine lock poisoned"))?;
    log::info!("{:?}: sum is {}", state, machine.registers()[1]);

    Ok(())
}
