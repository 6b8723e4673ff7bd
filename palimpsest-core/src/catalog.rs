//! Module catalog
//!
//! Read once at boot from external flash and immutable afterwards. Only
//! populated slots are kept, in their on-flash order, which is also the
//! order the dispatcher cycles through them.

use heapless::{String, Vec};
use palimpsest_abi::{FunctionRecord, ModuleRecord, MAX_FUNCTIONS, MAX_MODULES, NAME_LEN};
use palimpsest_hal::{FlashError, SourceFlash};
use zerocopy::{FromZeros, IntoBytes};

#[cfg(feature = "peripheral-deps")]
use palimpsest_abi::PeripheralMask;

use crate::log::{debug, warn};

/// Display name, terminator excluded
pub type FunctionName = String<{ NAME_LEN - 1 }>;

/// Catalog decode errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// Reading the catalog from external flash failed
    Transport(FlashError),
    /// Two populated slots share an id
    DuplicateModuleId(u32),
    /// A module declares more functions than a record can hold
    TooManyFunctions { module_id: u32, count: u32 },
}

impl From<FlashError> for CatalogError {
    fn from(e: FlashError) -> Self {
        CatalogError::Transport(e)
    }
}

/// One loadable function
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FunctionInfo {
    pub name: FunctionName,
    /// Offset of the code image from the module base
    pub offset: u32,
    /// Code image length in bytes
    pub size: u32,
    /// Expected checksum of the code image
    pub checksum: u32,
    #[cfg(feature = "peripheral-deps")]
    pub peripherals: PeripheralMask,
}

impl FunctionInfo {
    fn from_record(record: &FunctionRecord) -> Self {
        let mut name = FunctionName::new();
        for &byte in record.name_bytes().iter().take(NAME_LEN - 1) {
            let ch = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '?'
            };
            // Capacity covers every byte taken above
            let _ = name.push(ch);
        }

        Self {
            name,
            offset: record.offset.get(),
            size: record.size.get(),
            checksum: record.crc.get(),
            #[cfg(feature = "peripheral-deps")]
            peripherals: PeripheralMask::from_bits_truncate(record.peripheral.get()),
        }
    }
}

/// A group of functions sharing one base address
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleInfo {
    pub module_id: u32,
    /// External address of the module region
    pub base_address: u32,
    /// Declared region size; 0 if undeclared
    pub image_size: u32,
    pub functions: Vec<FunctionInfo, MAX_FUNCTIONS>,
}

impl ModuleInfo {
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Function by 0-based index
    pub fn function(&self, index: usize) -> Option<&FunctionInfo> {
        self.functions.get(index)
    }

    fn from_record(record: &ModuleRecord) -> Result<Self, CatalogError> {
        let module_id = record.module_id.get();
        let count = record.func_count.get();
        if count as usize > MAX_FUNCTIONS {
            return Err(CatalogError::TooManyFunctions { module_id, count });
        }

        let functions = record.functions[..count as usize]
            .iter()
            .map(FunctionInfo::from_record)
            .collect();

        Ok(Self {
            module_id,
            base_address: record.address.get(),
            image_size: record.size.get(),
            functions,
        })
    }
}

/// All populated modules, in catalog order
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<ModuleInfo, MAX_MODULES>,
}

impl ModuleCatalog {
    /// An empty catalog
    pub const fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Replace the contents with the catalog stored at `address`
    ///
    /// Records are read one at a time so only a single record is buffered.
    /// On error the catalog is left empty. Returns the number of populated
    /// modules.
    pub fn load<F: SourceFlash>(
        &mut self,
        flash: &mut F,
        address: u32,
    ) -> Result<usize, CatalogError> {
        self.modules.clear();
        let mut record = ModuleRecord::new_zeroed();
        let stride = core::mem::size_of::<ModuleRecord>() as u32;

        for slot in 0..MAX_MODULES as u32 {
            let slot_address = address + slot * stride;
            if let Err(e) = flash.read(slot_address, record.as_mut_bytes()) {
                self.modules.clear();
                return Err(e.into());
            }
            if let Err(e) = self.push_record(&record) {
                self.modules.clear();
                return Err(e);
            }
        }

        debug!("catalog: {} modules", self.modules.len());
        Ok(self.modules.len())
    }

    /// Decode and append one record; unused slots are skipped
    pub fn push_record(&mut self, record: &ModuleRecord) -> Result<(), CatalogError> {
        if !record.is_populated() {
            return Ok(());
        }

        let id = record.module_id.get();
        if self.find(id).is_some() {
            warn!("catalog: duplicate module id {}", id);
            return Err(CatalogError::DuplicateModuleId(id));
        }

        let module = ModuleInfo::from_record(record)?;
        // MAX_MODULES slots map to MAX_MODULES entries
        let _ = self.modules.push(module);
        Ok(())
    }

    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module by id
    pub fn find(&self, module_id: u32) -> Option<&ModuleInfo> {
        self.modules.iter().find(|m| m.module_id == module_id)
    }
}
