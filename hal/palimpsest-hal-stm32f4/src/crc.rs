//! Hardware CRC unit
//!
//! The STM32F4 CRC peripheral computes exactly the word-wise CRC-32 the
//! image builder uses (poly 0x04C11DB7, init all-ones, no reflection), so
//! it can replace the software engine.

use embassy_stm32::crc::Crc;
use palimpsest_hal::ChecksumEngine;

/// [`ChecksumEngine`] on the CRC peripheral
pub struct HardwareCrc<'d> {
    crc: Crc<'d>,
}

impl<'d> HardwareCrc<'d> {
    pub fn new(crc: Crc<'d>) -> Self {
        Self { crc }
    }
}

impl ChecksumEngine for HardwareCrc<'_> {
    fn checksum(&mut self, data: &[u8]) -> u32 {
        self.crc.reset();
        let mut result = self.crc.read();

        let mut chunks = data.chunks_exact(4);
        for chunk in &mut chunks {
            result = self
                .crc
                .feed_word(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }

        let tail = chunks.remainder();
        if !tail.is_empty() {
            let mut word = [0u8; 4];
            word[..tail.len()].copy_from_slice(tail);
            result = self.crc.feed_word(u32::from_le_bytes(word));
        }

        result
    }
}
