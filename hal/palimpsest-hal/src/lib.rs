//! Palimpsest Hardware Abstraction Layer
//!
//! This crate defines the hardware contracts the overlay loader consumes.
//! Chip-specific crates implement them; the board-agnostic core only ever
//! sees these traits, which keeps the loader and dispatcher testable on
//! the host.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  palimpsest-firmware                     │
//! └──────────────────────────────────────────┘
//!            │                      │
//!            ▼                      ▼
//! ┌────────────────────┐  ┌──────────────────┐
//! │  palimpsest-core   │  │ palimpsest-      │
//! │  (loader, dispatch)│  │ drivers (W25Q,   │
//! └────────────────────┘  │ LED, console)    │
//!            │            └──────────────────┘
//!            ▼                      │
//! ┌──────────────────────────────────────────┐
//! │  palimpsest-hal (this crate - traits)    │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//!          ┌──────────────────────┐
//!          │ palimpsest-hal-      │
//!          │     stm32f4          │
//!          └──────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`uart::UartTx`] - Serial output
//! - [`spi::SpiBus`] - SPI bus operations
//! - [`flash::SourceFlash`], [`flash::ProgramMemory`] - Flash transport
//! - [`checksum::ChecksumEngine`] - Image integrity
//! - [`time::Clock`] - Millisecond tick and blocking delay

#![no_std]
#![deny(unsafe_code)]

pub mod checksum;
pub mod flash;
pub mod gpio;
pub mod spi;
pub mod time;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use checksum::ChecksumEngine;
pub use flash::{FlashError, ProgramMemory, SourceFlash};
pub use gpio::{ActiveLow, InputPin, OutputPin};
pub use spi::SpiBus;
pub use time::Clock;
pub use uart::UartTx;
