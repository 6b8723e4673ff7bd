//! Palimpsest module ABI
//!
//! This crate is the binary contract between the resident firmware and the
//! code modules it loads from external flash. Modules are compiled
//! independently, so every layout here must agree byte-for-byte on both
//! sides.
//!
//! # External flash layout
//!
//! ```text
//! 0x0000_0000 ┌──────────────────────────────┐
//!             │ Catalog: [ModuleRecord; 20]  │
//!             ├──────────────────────────────┤
//!             │              ...             │
//! base_address├──────────────────────────────┤
//!             │ code images @ func.offset    │
//!             │ GOT source  @ got offset     │
//!             │ PLT source  @ plt offset     │
//!             └──────────────────────────────┘
//! ```
//!
//! # Entry convention
//!
//! A loaded function is an [`ModuleEntryFn`]: it receives a pointer to the
//! host's [`CapabilityTable`] and one `u32` parameter (the active module
//! id). The table is the only way loaded code may reach host services.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod capability;
pub mod catalog;
pub mod crc;
pub mod peripheral;

pub use capability::{
    c_str_bytes, format_decimal, CapabilityTable, FormatFn, IndicatorFn, ModuleEntryFn, PrintFn,
    SensorFn, FORMAT_BUFFER_MIN, PRINT_LIMIT,
};
#[cfg(feature = "peripheral-deps")]
pub use capability::InitFn;
pub use catalog::{
    encode_name, FunctionRecord, ModuleRecord, CATALOG_SIZE, MAX_FUNCTIONS, MAX_MODULES, NAME_LEN,
};
pub use crc::{word_crc32, WordCrc32};
pub use peripheral::PeripheralMask;
