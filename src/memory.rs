use crate::error::{Fault, Result};

pub mod image;

pub type Byte = u8; // 1 byte
pub type Word = u16; // 2 bytes

/// Number of addressable words
pub const MEMORY_SIZE: usize = 0x8000;

/// Emulates the word-addressed main memory of the machine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Memory {
    /// The actual data of the memory, always `MEMORY_SIZE` words long
    data: Box<[Word]>,
}

impl Default for Memory {
    /// Initializes the memory with all words set to zero
    fn default() -> Self {
        Memory {
            data: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }
}

impl Memory {
    fn index(address: Word) -> Result<usize> {
        let address = address as usize;
        if address < MEMORY_SIZE {
            Ok(address)
        } else {
            Err(Fault::OutOfBounds { address })
        }
    }

    /// Reads a word from the memory
    pub fn read(&self, address: Word) -> Result<Word> {
        Ok(self.data[Self::index(address)?])
    }

    /// Writes a word to the memory
    pub fn write(&mut self, address: Word, value: Word) -> Result<()> {
        self.data[Self::index(address)?] = value;
        Ok(())
    }

    /// Writes a block of words starting at `base`.
    ///
    /// Nothing is written if the block does not fit.
    pub fn load(&mut self, base: Word, words: &[Word]) -> Result<()> {
        let start = base as usize;
        let end = start + words.len();
        if end > MEMORY_SIZE {
            return Err(Fault::ProgramTooLarge {
                base: start,
                len: words.len(),
            });
        }

        self.data[start..end].copy_from_slice(words);
        Ok(())
    }

    /// Returns up to `len` words starting at `base`, cut short at the end of memory
    pub fn window(&self, base: Word, len: usize) -> &[Word] {
        let start = (base as usize).min(MEMORY_SIZE);
        let end = start.saturating_add(len).min(MEMORY_SIZE);
        &self.data[start..end]
    }

    /// The whole address space
    pub fn words(&self) -> &[Word] {
        &self.data
    }

    /// Sets every word back to zero
    pub fn clear(&mut self) {
        for word in self.data.iter_mut() {
            *word = 0;
        }
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_words {
    ( $mem:ident : $pos:expr => $( $word:expr ),+ $(,)? ) => {
        $mem.load($pos, &[
            $(
                $word as $crate::memory::Word,
            )+
        ])
    };
}
