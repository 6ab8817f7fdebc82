//! Runs a program image until it halts or faults.
//!
//! ```text
//! cargo run --example run_image -- program.bin [base] [max-steps]
//! ```
//!
//! The base address and step limit accept decimal or `0x` hexadecimal.

use std::convert::TryFrom;
use std::env;

use color_eyre::eyre::{eyre, Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use virt16::peripherals::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use virt16::stack;
use virt16::{EngineState, Machine, Word};

const DEFAULT_MAX_STEPS: usize = 1_000_000;

fn parse_number(arg: &str) -> Result<usize> {
    let parsed = match arg.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.wrap_err_with(|| format!("Invalid number `{}`", arg))
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .init()?; // logging

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| eyre!("usage: run_image <program.bin> [base] [max-steps]"))?;
    let base = match args.next() {
        Some(arg) => Word::try_from(parse_number(&arg)?)
            .wrap_err_with(|| format!("Base address `{}` is out of range", arg))?,
        None => 0,
    };
    let max_steps = match args.next() {
        Some(arg) => parse_number(&arg)?,
        None => DEFAULT_MAX_STEPS,
    };

    let mut machine = Machine::from_image_file(&path, base)?;
    let state = machine
        .run(max_steps)
        .wrap_err_with(|| format!("Program faulted at 0x{:04X}", machine.pc()))?;

    if state == EngineState::Running {
        log::warn!("Stopped after {} steps, still running", max_steps);
    }

    log::info!(
        "State: {:?}  PC: 0x{:04X}  SP: 0x{:04X}  A: 0x{:04X}",
        state,
        machine.pc(),
        machine.sp(),
        machine.accumulator()
    );
    for (i, value) in machine.registers().iter().enumerate() {
        log::info!("R{}: 0x{:04X}", i + 1, value);
    }
    log::info!(
        "Ports: {:?}  Time: {}  Stack depth: {}",
        machine.ports(),
        machine.time(),
        stack::depth(machine.sp())
    );

    let frame: Vec<u8> = machine
        .display_frame(DISPLAY_WIDTH * DISPLAY_HEIGHT)
        .collect();
    for row in frame.chunks(DISPLAY_WIDTH) {
        if row.iter().any(|c| c.is_ascii_graphic()) {
            let line: String = row
                .iter()
                .map(|c| if c.is_ascii_graphic() || *c == b' ' { *c as char } else { ' ' })
                .collect();
            log::info!("|{}|", line);
        }
    }

    Ok(())
}
