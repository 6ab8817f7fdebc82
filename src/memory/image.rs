//! Program image format.
//!
//! An image is a headerless stream of words, each stored as two bytes with the
//! low byte first. It is loaded verbatim at a base address chosen by the driver.
//!
//! ```text
//!   bytes:  01 00 01 00 05 00 ff 00
//!   words:  0x0001 0x0001 0x0005 0x00ff    (LDI R1, #5; HALT)
//! ```

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use thiserror::Error;

use super::{Byte, Word, MEMORY_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("image has an odd number of bytes ({len}), the last word is incomplete")]
    OddLength { len: usize },
    #[error("image holds {words} words but memory only has room for {}", MEMORY_SIZE)]
    TooLarge { words: usize },
}

/// Turns raw image bytes into words.
pub fn decode(bytes: &[Byte]) -> Result<Vec<Word>, ImageError> {
    if bytes.len() % 2 != 0 {
        return Err(ImageError::OddLength { len: bytes.len() });
    }

    let words = bytes.len() / 2;
    if words > MEMORY_SIZE {
        return Err(ImageError::TooLarge { words });
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| Word::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Turns words into image bytes; the inverse of [`decode`].
pub fn encode(words: &[Word]) -> Vec<Byte> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

/// Reads and decodes an image file.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<Word>> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .wrap_err_with(|| format!("Failed to read program image {}", path.display()))?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());

    decode(&bytes).wrap_err_with(|| format!("Invalid program image {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_little_endian() {
        let words = decode(&[0x01, 0x00, 0x34, 0x12, 0xFF, 0x00]).unwrap();
        assert_eq!(words, vec![0x0001, 0x1234, 0x00FF]);
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(&[]), Ok(vec![]));
    }

    #[test]
    fn test_decode_odd_length() {
        assert_eq!(
            decode(&[0x01, 0x00, 0x02]),
            Err(ImageError::OddLength { len: 3 })
        );
    }

    #[test]
    fn test_decode_too_large() {
        let bytes = vec![0; (MEMORY_SIZE + 1) * 2];
        assert_eq!(
            decode(&bytes),
            Err(ImageError::TooLarge {
                words: MEMORY_SIZE + 1
            })
        );
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(&[0x1234, 0x00FF]), vec![0x34, 0x12, 0xFF, 0x00]);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_file("/nonexistent/program.bin").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/program.bin"));
    }
}
