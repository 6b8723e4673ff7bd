//! In-memory fakes shared by the unit tests

use core::ffi::c_char;

use palimpsest_abi::CapabilityTable;
use palimpsest_hal::{FlashError, ProgramMemory, SourceFlash};

use crate::catalog::ModuleInfo;
use crate::config::LoaderLayout;
use crate::dispatch::Host;
use crate::entry::EntryPoint;
use crate::loader::{FunctionLoader, LoadError};

/// External flash backed by a byte vector
pub struct MemFlash {
    pub bytes: Vec<u8>,
    pub reads: usize,
    pub fail_reads: bool,
}

impl MemFlash {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            reads: 0,
            fail_reads: false,
        }
    }
}

impl SourceFlash for MemFlash {
    fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), FlashError> {
        self.reads += 1;
        if self.fail_reads {
            return Err(FlashError::Transport);
        }
        let start = address as usize;
        let end = start + buffer.len();
        let src = self.bytes.get(start..end).ok_or(FlashError::OutOfBounds)?;
        buffer.copy_from_slice(src);
        Ok(())
    }
}

struct Region {
    base: u32,
    bytes: Vec<u8>,
}

/// Placement target with one region for the window and one for GOT/PLT
pub struct RamTarget {
    regions: Vec<Region>,
    pub writes: usize,
    pub fail_writes: bool,
}

impl RamTarget {
    pub fn for_layout(layout: &LoaderLayout) -> Self {
        let ram_base = layout.got.target_address.min(layout.plt.target_address);
        let ram_end = (layout.got.target_address + layout.got.size)
            .max(layout.plt.target_address + layout.plt.size);

        Self {
            regions: vec![
                Region {
                    base: layout.window_address,
                    bytes: vec![0xFF; layout.window_size as usize],
                },
                Region {
                    base: ram_base,
                    bytes: vec![0; (ram_end - ram_base) as usize],
                },
            ],
            writes: 0,
            fail_writes: false,
        }
    }

    /// `len` bytes starting at `address`
    pub fn region(&self, address: u32, len: usize) -> &[u8] {
        for r in &self.regions {
            if address >= r.base {
                let start = (address - r.base) as usize;
                if start + len <= r.bytes.len() {
                    return &r.bytes[start..start + len];
                }
            }
        }
        panic!("address {address:#x} not mapped");
    }

    /// Every mapped byte, concatenated
    pub fn snapshot(&self) -> Vec<u8> {
        self.regions.iter().flat_map(|r| r.bytes.clone()).collect()
    }
}

impl ProgramMemory for RamTarget {
    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        if self.fail_writes {
            return Err(FlashError::Program);
        }
        for r in &mut self.regions {
            if address >= r.base {
                let start = (address - r.base) as usize;
                if start + data.len() <= r.bytes.len() {
                    r.bytes[start..start + data.len()].copy_from_slice(data);
                    self.writes += 1;
                    return Ok(());
                }
            }
        }
        Err(FlashError::OutOfBounds)
    }
}

/// Host that records everything it is asked to do
#[derive(Default)]
pub struct RecordingHost {
    pub lines: Vec<String>,
    pub indicator: Vec<bool>,
    pub delays: Vec<u32>,
    #[cfg(feature = "peripheral-deps")]
    pub peripherals: Vec<palimpsest_abi::PeripheralMask>,
}

impl Host for RecordingHost {
    fn print_line(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn set_indicator(&mut self, on: bool) {
        self.indicator.push(on);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }

    #[cfg(feature = "peripheral-deps")]
    fn init_peripherals(&mut self, mask: palimpsest_abi::PeripheralMask) {
        self.peripherals.push(mask);
    }
}

/// Entry point that records calls instead of jumping
#[derive(Default)]
pub struct RecordingEntry {
    pub calls: Vec<u32>,
}

impl EntryPoint for RecordingEntry {
    fn enter(&mut self, _table: &CapabilityTable, module_id: u32) {
        self.calls.push(module_id);
    }
}

/// Loader that succeeds unless told otherwise
pub struct ScriptedLoader {
    pub layout: LoaderLayout,
    pub loads: Vec<(u32, usize)>,
    pub fail_with: Option<LoadError>,
}

impl Default for ScriptedLoader {
    fn default() -> Self {
        Self {
            layout: LoaderLayout::STM32F401,
            loads: Vec::new(),
            fail_with: None,
        }
    }
}

impl FunctionLoader for ScriptedLoader {
    fn load_function(&mut self, module: &ModuleInfo, index: usize) -> Result<(), LoadError> {
        match self.fail_with {
            Some(e) => Err(e),
            None => {
                self.loads.push((module.module_id, index));
                Ok(())
            }
        }
    }

    fn layout(&self) -> &LoaderLayout {
        &self.layout
    }
}

extern "C" fn nop_print(_: *const c_char) {}
extern "C" fn nop_indicator(_: u8) {}
#[cfg(feature = "peripheral-deps")]
extern "C" fn nop_init() {}
extern "C" fn nop_sensor() -> i32 {
    0
}
extern "C" fn nop_format(_: *mut c_char, _: i32) {}

/// Capability table whose slots do nothing
pub fn table() -> CapabilityTable {
    #[cfg(not(feature = "peripheral-deps"))]
    return CapabilityTable::new(nop_print, nop_indicator, nop_sensor, nop_format);
    #[cfg(feature = "peripheral-deps")]
    return CapabilityTable::new(
        nop_print,
        nop_indicator,
        nop_init,
        nop_init,
        nop_sensor,
        nop_format,
    );
}
