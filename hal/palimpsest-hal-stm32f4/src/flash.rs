//! Placement target for STM32F4
//!
//! The loader writes to two kinds of internal memory:
//!
//! ```text
//! 0x0800_0000 ┌─────────────┐
//!             │ resident    │
//! window ───► ├─────────────┤  erased + programmed via NorFlash
//!             │ exec window │
//!             ├─────────────┤
//!             │ resident    │
//!             └─────────────┘
//! 0x2000_0000 ┌─────────────┐
//!  reserved ─►│ GOT │ PLT   │  plain volatile copy
//!             ├─────────────┤
//!             │ .data/.bss  │
//!             └─────────────┘
//! ```
//!
//! Both ranges are reserved in `memory.x`, so nothing else lives there.
//! Any address outside them is rejected.

use core::ops::Range;

use embedded_storage::nor_flash::NorFlash;
use palimpsest_hal::{FlashError, ProgramMemory};

/// Internal flash base address
pub const FLASH_BASE: u32 = 0x0800_0000;

/// Largest supported flash write granularity
const MAX_WRITE_SIZE: usize = 16;

/// Routes `program` calls to the execution window or reserved SRAM
pub struct PlacementTarget<F> {
    flash: F,
    window: Range<u32>,
    ram: Range<u32>,
}

impl<F: NorFlash> PlacementTarget<F> {
    /// Create a target
    ///
    /// `window` must be absolute, inside internal flash and aligned to the
    /// erase size. `ram` is the absolute SRAM range reserved for GOT/PLT.
    pub fn new(flash: F, window: Range<u32>, ram: Range<u32>) -> Result<Self, FlashError> {
        if window.start < FLASH_BASE || window.end < window.start {
            return Err(FlashError::OutOfBounds);
        }
        let erase = F::ERASE_SIZE as u32;
        if (window.start - FLASH_BASE) % erase != 0 || (window.end - window.start) % erase != 0 {
            return Err(FlashError::Misaligned);
        }
        if F::WRITE_SIZE > MAX_WRITE_SIZE {
            return Err(FlashError::Misaligned);
        }
        Ok(Self { flash, window, ram })
    }

    fn program_window(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        let write = F::WRITE_SIZE;
        let offset = address - FLASH_BASE;
        if offset as usize % write != 0 {
            return Err(FlashError::Misaligned);
        }

        self.flash
            .erase(self.window.start - FLASH_BASE, self.window.end - FLASH_BASE)
            .map_err(|_| FlashError::Erase)?;

        let aligned = data.len() - data.len() % write;
        if aligned > 0 {
            self.flash
                .write(offset, &data[..aligned])
                .map_err(|_| FlashError::Program)?;
        }

        let tail = &data[aligned..];
        if !tail.is_empty() {
            let mut padded = [0xFFu8; MAX_WRITE_SIZE];
            padded[..tail.len()].copy_from_slice(tail);
            self.flash
                .write(offset + aligned as u32, &padded[..write])
                .map_err(|_| FlashError::Program)?;
        }

        Ok(())
    }

    #[allow(unsafe_code)]
    fn program_ram(&mut self, address: u32, data: &[u8]) {
        let dst = address as *mut u8;
        for (i, &byte) in data.iter().enumerate() {
            // SAFETY: `new`'s caller reserved `ram` for relocation data and
            // `program` checked the whole range lies inside it.
            unsafe { core::ptr::write_volatile(dst.add(i), byte) };
        }
    }
}

fn contains(range: &Range<u32>, address: u32, len: usize) -> bool {
    match address.checked_add(len as u32) {
        Some(end) => address >= range.start && end <= range.end,
        None => false,
    }
}

impl<F: NorFlash> ProgramMemory for PlacementTarget<F> {
    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        if contains(&self.window, address, data.len()) {
            self.program_window(address, data)
        } else if contains(&self.ram, address, data.len()) {
            self.program_ram(address, data);
            Ok(())
        } else {
            Err(FlashError::OutOfBounds)
        }
    }
}
