//! Board-agnostic core of the Palimpsest overlay loader
//!
//! This crate holds everything that does not touch hardware directly:
//!
//! - Module catalog decoding ([`catalog`])
//! - Fetch, verify and place of function images ([`loader`])
//! - The button-driven selection state machine ([`dispatch`])
//! - Placement layouts, timing and failure policy ([`config`])
//! - Control transfer into the execution window ([`entry`])
//!
//! Hardware is reached only through the `palimpsest-hal` traits, so the
//! whole crate runs under `cargo test` on the host.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "defmt")]
pub(crate) use defmt as log;
#[cfg(not(feature = "defmt"))]
pub(crate) mod log;

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod entry;
pub mod loader;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{CatalogError, FunctionInfo, ModuleCatalog, ModuleInfo};
pub use config::{DispatchTiming, DispatcherConfig, FailurePolicy, LoaderLayout, RelocationRegion};
pub use dispatch::{Dispatcher, Host, Outcome};
pub use entry::{EntryPoint, WindowEntry};
pub use loader::{FunctionLoader, LoadError, Loader};
