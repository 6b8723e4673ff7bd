//! Word-wise CRC-32
//!
//! Matches the STM32 hardware CRC unit in its reset configuration:
//! polynomial `0x04C11DB7`, initial value `0xFFFF_FFFF`, MSB first, no
//! reflection, no final XOR. Input is consumed one little-endian `u32` at
//! a time; a trailing partial word is zero-padded.
//!
//! The image builder and the loader must agree on this exactly, so both
//! use [`word_crc32`].

use palimpsest_hal::ChecksumEngine;

const POLY: u32 = 0x04C1_1DB7;
const INIT: u32 = 0xFFFF_FFFF;

fn feed_word(mut crc: u32, word: u32) -> u32 {
    crc ^= word;
    for _ in 0..32 {
        crc = if crc & 0x8000_0000 != 0 {
            (crc << 1) ^ POLY
        } else {
            crc << 1
        };
    }
    crc
}

/// Compute the word-wise CRC-32 of `data`
pub fn word_crc32(data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(4);
    let mut crc = INIT;

    for chunk in &mut chunks {
        crc = feed_word(crc, u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut word = [0u8; 4];
        word[..tail.len()].copy_from_slice(tail);
        crc = feed_word(crc, u32::from_le_bytes(word));
    }

    crc
}

/// Software [`ChecksumEngine`] over [`word_crc32`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCrc32;

impl ChecksumEngine for WordCrc32 {
    fn checksum(&mut self, data: &[u8]) -> u32 {
        word_crc32(data)
    }
}
