//! Device drivers for the Palimpsest firmware
//!
//! Concrete implementations built on the `palimpsest-hal` traits:
//!
//! - W25Qxx SPI NOR flash as the module source ([`w25q`])
//! - Status LED ([`led`])
//! - UART text console ([`console`])
//! - Shared board services for the dispatcher and loaded code ([`services`])

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "defmt")]
pub(crate) use defmt as log;
#[cfg(not(feature = "defmt"))]
pub(crate) mod log;

pub mod console;
pub mod led;
pub mod services;
pub mod w25q;

pub use console::UartConsole;
pub use led::StatusLed;
pub use services::BoardServices;
pub use w25q::{JedecId, W25q};
