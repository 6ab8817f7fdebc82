use std::path::Path;

use color_eyre::eyre;
use log::debug;

use crate::error::{Fault, Result};
use crate::memory::{image, Byte, Memory, Word};
use crate::peripherals::{Peripherals, PORT_COUNT};
use crate::processor::{EngineState, Processor};
use crate::registers::{Flags, REGISTER_COUNT};

/// The whole virtual machine.
///
/// A driver owns one `Machine`, loads a program into it and calls
/// [`Machine::execute`] once per step. All state can be inspected through the
/// read-only accessors; the only ways to change it are [`Machine::reset`],
/// [`Machine::load_program`], [`Machine::execute`] and the peripheral inputs
/// [`Machine::set_port`] and [`Machine::tick`].
///
/// The machine does no locking of its own. Drivers stepping it from another
/// thread should put the whole machine behind one mutex.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Machine {
    processor: Processor,
    memory: Memory,
    peripherals: Peripherals,
}

impl Machine {
    /// Creates a machine in the all-zero state, with no program loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a machine running the program image at `path`
    pub fn from_image_file<P: AsRef<Path>>(path: P, base: Word) -> eyre::Result<Self> {
        let words = image::read_file(path)?;
        let mut machine = Self::new();
        machine.load_program(&words, base)?;
        Ok(machine)
    }

    /// Returns the machine to the state of [`Machine::new`]
    pub fn reset(&mut self) {
        self.memory.clear();
        self.processor = Processor::default();
        self.peripherals = Peripherals::default();
    }

    /// Writes `words` into memory at `base` and starts a fresh run there.
    ///
    /// Registers, flags, ports, the display base and the tick counter are
    /// cleared, SP is put at the top of the stack region. Memory outside the
    /// program is left alone. If the program does not fit nothing changes.
    /// An empty program may sit at `MEMORY_SIZE`; its first step then faults.
    pub fn load_program(&mut self, words: &[Word], base: Word) -> Result<()> {
        self.memory.load(base, words)?;
        self.processor = Processor::new(base);
        self.peripherals = Peripherals::default();

        debug!("Loaded {} words at 0x{:04X}", words.len(), base);
        Ok(())
    }

    /// Executes a single instruction and returns the resulting state.
    ///
    /// Does nothing while halted or faulted. A fault is returned as an error and
    /// leaves the machine in [`EngineState::Faulted`].
    pub fn execute(&mut self) -> Result<EngineState> {
        self.processor.execute(&mut self.memory, &mut self.peripherals)
    }

    /// Executes instructions until the machine stops running or `max_steps`
    /// instructions have been executed
    pub fn run(&mut self, max_steps: usize) -> Result<EngineState> {
        for _ in 0..max_steps {
            if self.execute()? != EngineState::Running {
                break;
            }
        }

        Ok(self.state())
    }

    /// Advances the tick counter from an external clock
    pub fn tick(&mut self) {
        self.peripherals.tick();
    }

    /// Feeds a word into a peripheral port
    pub fn set_port(&mut self, port: Word, value: Word) -> Result<()> {
        self.peripherals.set_port(port, value)
    }

    /// The whole address space
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Reads the word at `address`
    pub fn read(&self, address: Word) -> Result<Word> {
        self.memory.read(address)
    }

    /// The processor state
    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// General purpose register `index` (1..=15)
    pub fn register(&self, index: Word) -> Result<Word> {
        self.processor.registers().get(index)
    }

    /// R1..R15 in order
    pub fn registers(&self) -> &[Word; REGISTER_COUNT] {
        self.processor.registers().general()
    }

    /// The accumulator A
    pub fn accumulator(&self) -> Word {
        self.processor.registers().accumulator()
    }

    /// Program counter
    pub fn pc(&self) -> Word {
        self.processor.pc()
    }

    /// Stack pointer
    pub fn sp(&self) -> Word {
        self.processor.sp()
    }

    /// Condition flags
    pub fn flags(&self) -> Flags {
        self.processor.flags()
    }

    /// P1..P4 in order
    pub fn ports(&self) -> &[Word; PORT_COUNT] {
        self.peripherals.ports()
    }

    /// Base address of the display frame
    pub fn video(&self) -> Word {
        self.peripherals.video()
    }

    /// Value of the tick counter
    pub fn time(&self) -> Word {
        self.peripherals.time()
    }

    /// Whether the machine is running, halted or faulted
    pub fn state(&self) -> EngineState {
        self.processor.state()
    }

    /// The fault that stopped the machine, if any
    pub fn last_fault(&self) -> Option<Fault> {
        self.processor.last_fault()
    }

    /// Instructions executed since the last load or reset
    pub fn step_count(&self) -> u64 {
        self.processor.steps()
    }

    /// The character codes of the display frame: the low byte of up to `len`
    /// words starting at the display base address
    pub fn display_frame(&self, len: usize) -> impl Iterator<Item = Byte> + '_ {
        self.memory
            .window(self.video(), len)
            .iter()
            .map(|word| (word & 0xFF) as Byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
    use crate::processor::Instruction::*;
    use crate::registers::Register::*;
    use crate::memory::MEMORY_SIZE;
    use crate::stack::STACK_TOP;
    use color_eyre::eyre::Result;

    #[test]
    fn test_new_is_all_zero() {
        let machine = Machine::new();

        assert_eq!(machine.pc(), 0);
        assert_eq!(machine.sp(), 0);
        assert_eq!(machine.accumulator(), 0);
        assert_eq!(machine.registers(), &[0; REGISTER_COUNT]);
        assert_eq!(machine.flags(), Flags::default());
        assert_eq!(machine.ports(), &[0; PORT_COUNT]);
        assert_eq!(machine.video(), 0);
        assert_eq!(machine.time(), 0);
        assert_eq!(machine.state(), EngineState::Halted);
        assert!(machine.memory().words().iter().all(|word| *word == 0));
    }

    #[test]
    fn test_fresh_machine_does_not_run() -> Result<()> {
        let mut machine = Machine::new();

        assert_eq!(machine.execute()?, EngineState::Halted);
        assert_eq!(machine, Machine::new());

        Ok(())
    }

    #[test]
    fn test_load_program() -> Result<()> {
        let mut machine = Machine::new();
        machine.load_program(&[LDI as Word, R1 as Word, 7, HALT as Word], 0)?;

        assert_eq!(machine.pc(), 0);
        assert_eq!(machine.sp(), STACK_TOP);
        assert_eq!(machine.registers(), &[0; REGISTER_COUNT]);
        assert_eq!(machine.accumulator(), 0);
        assert_eq!(machine.flags(), Flags::default());
        assert_eq!(machine.state(), EngineState::Running);
        assert_eq!(machine.read(2)?, 7);

        Ok(())
    }

    #[test]
    fn test_load_program_at_base() -> Result<()> {
        let mut machine = Machine::new();
        machine.load_program(&[HALT as Word], 0x0200)?;

        assert_eq!(machine.pc(), 0x0200);
        assert_eq!(machine.read(0x0200)?, HALT as Word);
        assert_eq!(machine.execute()?, EngineState::Halted);

        Ok(())
    }

    #[test]
    fn test_load_clears_previous_run() -> Result<()> {
        let mut machine = Machine::new();
        machine.load_program(
            &[
                LDI as Word, R4 as Word, 9,
                CMPI as Word, R4 as Word, 9,
                LDI as Word, A as Word, 7,
                LDI as Word, DISP as Word, 0x1000,
                OUT as Word, 2, R4 as Word,
                0x0777,
            ],
            0,
        )?;
        let fault = machine.run(10).unwrap_err();

        assert_eq!(
            fault,
            Fault::InvalidOpcode {
                opcode: 0x0777,
                address: 15
            }
        );
        assert_eq!(machine.ports(), &[0, 0, 9, 0]);
        assert!(machine.flags().e);
        assert_eq!(machine.accumulator(), 7);
        assert_eq!(machine.video(), 0x1000);

        machine.load_program(&[HALT as Word], 0)?;

        assert_eq!(machine.state(), EngineState::Running);
        assert_eq!(machine.registers(), &[0; REGISTER_COUNT]);
        assert_eq!(machine.accumulator(), 0);
        assert_eq!(machine.flags(), Flags::default());
        assert_eq!(machine.sp(), STACK_TOP);
        assert_eq!(machine.ports(), &[0; PORT_COUNT]);
        assert_eq!(machine.video(), 0);
        assert_eq!(machine.time(), 0);
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.last_fault(), None);

        Ok(())
    }

    #[test]
    fn test_from_image_file() -> Result<()> {
        let path = std::env::temp_dir().join(format!("virt16-{}.img", std::process::id()));
        let program = [LDI as Word, R1 as Word, 5, HALT as Word];
        std::fs::write(&path, image::encode(&program))?;

        let loaded = Machine::from_image_file(&path, 0x0010);
        std::fs::remove_file(&path)?;
        let mut machine = loaded?;

        assert_eq!(machine.pc(), 0x0010);
        assert_eq!(machine.read(0x0013)?, HALT as Word);
        assert_eq!(machine.run(10)?, EngineState::Halted);
        assert_eq!(machine.register(1)?, 5);
        assert_eq!(machine.pc(), 0x0014);

        Ok(())
    }

    #[test]
    fn test_empty_program_at_end_of_memory() -> Result<()> {
        let mut machine = Machine::new();
        machine.load_program(&[], MEMORY_SIZE as Word)?;

        assert_eq!(machine.state(), EngineState::Running);
        assert_eq!(machine.execute(), Err(Fault::OutOfBounds { address: MEMORY_SIZE }));
        assert_eq!(machine.state(), EngineState::Faulted);

        Ok(())
    }

    #[test]
    fn test_program_too_large() {
        let mut machine = Machine::new();
        let words = vec![0; 0x10];

        assert_eq!(
            machine.load_program(&words, 0x7FF8),
            Err(Fault::ProgramTooLarge {
                base: 0x7FF8,
                len: 0x10
            })
        );
        assert_eq!(machine, Machine::new());
    }

    #[test]
    fn test_reset() -> Result<()> {
        let mut machine = Machine::new();
        machine.load_program(&[LDI as Word, R1 as Word, 5, HALT as Word], 0x0100)?;
        machine.run(10)?;
        machine.set_port(1, 3)?;

        machine.reset();

        assert_eq!(machine, Machine::new());

        Ok(())
    }

    #[test]
    fn test_tick_and_ports() -> Result<()> {
        let mut machine = Machine::new();
        machine.tick();
        machine.tick();
        machine.set_port(0, 0x41)?;

        assert_eq!(machine.time(), 2);
        assert_eq!(machine.ports()[0], 0x41);
        assert_eq!(
            machine.set_port(4, 1),
            Err(Fault::InvalidPort { port: 4 })
        );

        Ok(())
    }

    #[test]
    fn test_display_frame() -> Result<()> {
        let mut machine = Machine::new();
        let text: Vec<Word> = "HI".bytes().map(|b| 0x0700 | b as Word).collect();
        machine.load_program(&text, 0x1000)?;
        machine.load_program(&[LDI as Word, DISP as Word, 0x1000, HALT as Word], 0)?;
        machine.run(10)?;

        let frame: Vec<Byte> = machine.display_frame(DISPLAY_WIDTH * DISPLAY_HEIGHT).collect();
        assert_eq!(frame.len(), DISPLAY_WIDTH * DISPLAY_HEIGHT);
        assert_eq!(&frame[..3], b"HI\0");

        Ok(())
    }

    #[test]
    fn test_display_frame_clamped_to_memory() -> Result<()> {
        let mut machine = Machine::new();
        machine.load_program(&[LDI as Word, DISP as Word, 0x7FF0, HALT as Word], 0)?;
        machine.run(10)?;

        assert_eq!(machine.display_frame(DISPLAY_WIDTH * DISPLAY_HEIGHT).count(), 16);

        Ok(())
    }

    #[test]
    fn test_machine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Machine>();
    }
}
