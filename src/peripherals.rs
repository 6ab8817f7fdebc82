use crate::error::{Fault, Result};
use crate::memory::Word;

/// Number of I/O ports
pub const PORT_COUNT: usize = 4;

/// Width of the display grid in characters
pub const DISPLAY_WIDTH: usize = 32;
/// Height of the display grid in characters
pub const DISPLAY_HEIGHT: usize = 32;

/// The I/O ports, the display base register and the tick counter.
///
/// What each port means is up to the deployment; the machine only moves words
/// in and out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Peripherals {
    ports: [Word; PORT_COUNT],
    /// Base address of the display frame buffer
    video: Word,
    /// Counts executed instructions and external ticks
    time: Word,
}

impl Peripherals {
    fn slot(port: Word) -> Result<usize> {
        if (port as usize) < PORT_COUNT {
            Ok(port as usize)
        } else {
            Err(Fault::InvalidPort { port })
        }
    }

    /// Reads port `port` (0..=3)
    pub fn port(&self, port: Word) -> Result<Word> {
        Ok(self.ports[Self::slot(port)?])
    }

    /// Writes port `port` (0..=3)
    pub fn set_port(&mut self, port: Word, value: Word) -> Result<()> {
        self.ports[Self::slot(port)?] = value;
        Ok(())
    }

    /// P1..P4 in order
    pub fn ports(&self) -> &[Word; PORT_COUNT] {
        &self.ports
    }

    /// Base address of the display frame
    pub fn video(&self) -> Word {
        self.video
    }

    /// Moves the display frame to `address`
    pub fn set_video(&mut self, address: Word) {
        self.video = address;
    }

    /// Value of the tick counter
    pub fn time(&self) -> Word {
        self.time
    }

    /// Overwrites the tick counter
    pub fn set_time(&mut self, time: Word) {
        self.time = time;
    }

    /// Advances the tick counter by one, wrapping around
    pub fn tick(&mut self) {
        self.time = self.time.wrapping_add(1);
    }
}
