//! Catalog wire records
//!
//! The catalog is a fixed array of [`ModuleRecord`]s at external address 0.
//! Every field is a little-endian `u32` (or a NUL-padded name), so the
//! records have alignment 1 and no padding; they can be read straight out
//! of a flash buffer.
//!
//! Record format:
//! - FunctionRecord: func_index, name[16], offset, size, crc
//!   (+ peripheral mask with `peripheral-deps`)
//! - ModuleRecord: module_id, address, size, crc, func_count,
//!   functions[MAX_FUNCTIONS]

use core::mem::size_of;

use static_assertions::const_assert_eq;
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

#[cfg(feature = "peripheral-deps")]
use crate::peripheral::PeripheralMask;

/// Maximum modules in the catalog
pub const MAX_MODULES: usize = 20;

/// Maximum functions per module
pub const MAX_FUNCTIONS: usize = 20;

/// Name field width on the wire, terminator included
pub const NAME_LEN: usize = 16;

/// Metadata for one loadable function
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct FunctionRecord {
    /// Index the image builder assigned (informational)
    pub func_index: U32,
    /// Display name, NUL padded
    pub name: [u8; NAME_LEN],
    /// Code image offset relative to the module base
    pub offset: U32,
    /// Code image length in bytes
    pub size: U32,
    /// Expected word-wise CRC-32 of the code image
    pub crc: U32,
    /// Peripherals to bring up before the function runs
    #[cfg(feature = "peripheral-deps")]
    pub peripheral: U32,
}

/// Metadata for one module and its functions
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct ModuleRecord {
    /// Module id; 0 marks an unused slot
    pub module_id: U32,
    /// Base address of the module region in external flash
    pub address: U32,
    /// Declared module region size (0 = undeclared)
    pub size: U32,
    /// Reserved for a whole-module checksum
    pub crc: U32,
    /// Number of valid entries in `functions`
    pub func_count: U32,
    /// Function table; entries past `func_count` are zero
    pub functions: [FunctionRecord; MAX_FUNCTIONS],
}

#[cfg(not(feature = "peripheral-deps"))]
const_assert_eq!(size_of::<FunctionRecord>(), 32);
#[cfg(feature = "peripheral-deps")]
const_assert_eq!(size_of::<FunctionRecord>(), 36);

const_assert_eq!(
    size_of::<ModuleRecord>(),
    20 + MAX_FUNCTIONS * size_of::<FunctionRecord>()
);

/// Total catalog size in external flash
pub const CATALOG_SIZE: usize = MAX_MODULES * size_of::<ModuleRecord>();

/// Encode a display name into the fixed wire field
///
/// Names longer than 15 bytes are truncated so the terminator always fits.
pub fn encode_name(name: &str) -> [u8; NAME_LEN] {
    let mut field = [0u8; NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(NAME_LEN - 1);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

impl FunctionRecord {
    /// An all-zero (unused) record
    pub const EMPTY: Self = Self {
        func_index: U32::ZERO,
        name: [0; NAME_LEN],
        offset: U32::ZERO,
        size: U32::ZERO,
        crc: U32::ZERO,
        #[cfg(feature = "peripheral-deps")]
        peripheral: U32::ZERO,
    };

    /// Build a record for a function image
    pub fn new(func_index: u32, name: &str, offset: u32, size: u32, crc: u32) -> Self {
        Self {
            func_index: U32::new(func_index),
            name: encode_name(name),
            offset: U32::new(offset),
            size: U32::new(size),
            crc: U32::new(crc),
            #[cfg(feature = "peripheral-deps")]
            peripheral: U32::ZERO,
        }
    }

    /// Attach a peripheral dependency mask
    #[cfg(feature = "peripheral-deps")]
    pub fn with_peripherals(mut self, mask: PeripheralMask) -> Self {
        self.peripheral = U32::new(mask.bits());
        self
    }

    /// Name bytes up to (not including) the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_LEN);
        &self.name[..end]
    }
}

impl ModuleRecord {
    /// An unused catalog slot
    pub const EMPTY: Self = Self {
        module_id: U32::ZERO,
        address: U32::ZERO,
        size: U32::ZERO,
        crc: U32::ZERO,
        func_count: U32::ZERO,
        functions: [FunctionRecord::EMPTY; MAX_FUNCTIONS],
    };

    /// Start a module record with no functions
    pub fn new(module_id: u32, address: u32, size: u32) -> Self {
        Self {
            module_id: U32::new(module_id),
            address: U32::new(address),
            size: U32::new(size),
            ..Self::EMPTY
        }
    }

    /// Append a function record
    ///
    /// Returns the record back if the function table is full.
    pub fn push_function(&mut self, record: FunctionRecord) -> Result<(), FunctionRecord> {
        let count = self.func_count.get() as usize;
        if count >= MAX_FUNCTIONS {
            return Err(record);
        }
        self.functions[count] = record;
        self.func_count = U32::new(count as u32 + 1);
        Ok(())
    }

    /// Check if this slot holds a module
    pub fn is_populated(&self) -> bool {
        self.module_id.get() != 0
    }
}

impl Default for ModuleRecord {
    fn default() -> Self {
        Self::EMPTY
    }
}
