//! STM32F4-specific HAL for the Palimpsest firmware
//!
//! Adapters from the embedded ecosystem traits that `embassy-stm32`
//! implements to the `palimpsest-hal` traits the core consumes:
//!
//! - [`gpio`] - `embedded_hal::digital` pins
//! - [`spi`] - `embedded_hal::spi::SpiBus`
//! - [`uart`] - `embedded_io::Write`
//! - [`flash`] - placement target over `embedded_storage` `NorFlash` plus
//!   reserved SRAM
//! - [`crc`] - the on-chip CRC unit
//! - [`clock`] - `embassy_time` millisecond clock
//!
//! # Features
//!
//! - `stm32f401cc` / `stm32f401re` - chip selection for `embassy-stm32`
//! - `defmt` - Enable debug formatting support

#![no_std]

pub mod clock;
pub mod crc;
pub mod flash;
pub mod gpio;
pub mod spi;
pub mod uart;

pub use clock::EmbassyClock;
pub use crc::HardwareCrc;
pub use flash::{PlacementTarget, FLASH_BASE};
pub use gpio::{HalInput, HalOutput};
pub use spi::HalSpi;
pub use uart::HalUart;
