//! Loader and dispatcher configuration
//!
//! Where code and relocation data land is a property of the board and the
//! module toolchain, not of any single function, so it lives here rather
//! than in the catalog. Presets cover the two supported targets; the pack
//! tool reads the same [`LoaderLayout`] from its manifest.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which relocation region a value refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelocationKind {
    Got,
    Plt,
}

/// One fixed-address relocation region (GOT or PLT)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelocationRegion {
    /// Offset of the source bytes from the module base address
    pub source_offset: u32,
    /// Internal address the bytes are placed at
    pub target_address: u32,
    /// Region length in bytes
    pub size: u32,
}

/// Placement map for the execution window and relocation regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoaderLayout {
    /// External address of the catalog
    pub catalog_address: u32,
    /// Internal address of the execution window
    pub window_address: u32,
    /// Execution window length in bytes
    pub window_size: u32,
    /// Set the Thumb bit on the entry address
    pub thumb: bool,
    pub got: RelocationRegion,
    pub plt: RelocationRegion,
}

impl LoaderLayout {
    /// STM32F401: window in flash sector 1, GOT/PLT at the start of SRAM
    pub const STM32F401: Self = Self {
        catalog_address: 0,
        window_address: 0x0800_4000,
        window_size: 0x4000,
        thumb: true,
        got: RelocationRegion {
            source_offset: 0x1000,
            target_address: 0x2000_0000,
            size: 100,
        },
        plt: RelocationRegion {
            source_offset: 0x1064,
            target_address: 0x2000_0064,
            size: 50,
        },
    };

    /// V85xx metering SoC: flash mapped at 0, same relocation scheme
    pub const V85XX: Self = Self {
        catalog_address: 0,
        window_address: 0x0000_2000,
        window_size: 0x2000,
        thumb: true,
        got: RelocationRegion {
            source_offset: 0x1000,
            target_address: 0x2000_0000,
            size: 100,
        },
        plt: RelocationRegion {
            source_offset: 0x1064,
            target_address: 0x2000_0064,
            size: 50,
        },
    };

    /// Address control is transferred to
    pub fn entry_address(&self) -> u32 {
        self.window_address | u32::from(self.thumb)
    }

    /// Relocation region by kind
    pub fn region(&self, kind: RelocationKind) -> &RelocationRegion {
        match kind {
            RelocationKind::Got => &self.got,
            RelocationKind::Plt => &self.plt,
        }
    }
}

impl Default for LoaderLayout {
    fn default() -> Self {
        Self::STM32F401
    }
}

/// Input and signalling timing, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DispatchTiming {
    /// Minimum interval between accepted activations
    pub debounce_ms: u32,
    /// Inactivity after which a partial selection is dropped
    pub idle_timeout_ms: u32,
    /// How often the firmware samples the button
    pub poll_interval_ms: u32,
    /// Indicator on/off time for failure blinks
    pub blink_ms: u32,
}

impl Default for DispatchTiming {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            idle_timeout_ms: 1000,
            poll_interval_ms: 10,
            blink_ms: 250,
        }
    }
}

/// What the dispatcher does after a failed load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FailurePolicy {
    /// Blink `blinks` times, return to idle and allow a retry
    Recoverable { blinks: u8 },
    /// Halt; only a reset recovers
    FailStop,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::Recoverable { blinks: 3 }
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DispatcherConfig {
    pub timing: DispatchTiming,
    pub failure: FailurePolicy,
}
