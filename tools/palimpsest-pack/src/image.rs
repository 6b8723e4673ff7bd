//! External-flash image assembly
//!
//! The output is a flat image of the NOR device starting at address 0.
//! Unwritten bytes are `0xFF`, the erased state, so the image can be
//! programmed as-is.

use std::ops::Range;

use palimpsest_abi::{
    word_crc32, FunctionRecord, ModuleRecord, CATALOG_SIZE, MAX_FUNCTIONS, MAX_MODULES, NAME_LEN,
};
use palimpsest_core::loader::{RELOCATION_CAPACITY, STAGING_CAPACITY};
use palimpsest_core::{LoaderLayout, ModuleCatalog};
use zerocopy::IntoBytes;

#[cfg(feature = "peripheral-deps")]
use palimpsest_abi::PeripheralMask;

use crate::error::PackError;
use crate::manifest::FunctionSpec;

/// Erased NOR flash
const ERASED: u8 = 0xFF;

/// One module with its input files already read
#[derive(Debug, Clone)]
pub struct ModuleInput {
    pub id: u32,
    pub address: u32,
    pub declared_size: Option<u32>,
    pub image: Vec<u8>,
    pub got: Option<Vec<u8>>,
    pub plt: Option<Vec<u8>>,
    pub functions: Vec<FunctionSpec>,
}

/// Accumulates modules into a catalog and a flat image
pub struct ImageBuilder {
    layout: LoaderLayout,
    records: Vec<ModuleRecord>,
    catalog: ModuleCatalog,
    chunks: Vec<(u32, Vec<u8>, String)>,
}

impl ImageBuilder {
    pub fn new(layout: LoaderLayout) -> Result<Self, PackError> {
        for (label, region) in [("GOT", layout.got), ("PLT", layout.plt)] {
            if region.size as usize > RELOCATION_CAPACITY {
                return Err(PackError::Layout(format!(
                    "{} size {} exceeds {}",
                    label, region.size, RELOCATION_CAPACITY
                )));
            }
        }

        Ok(Self {
            layout,
            records: Vec::new(),
            catalog: ModuleCatalog::new(),
            chunks: Vec::new(),
        })
    }

    /// Number of modules added so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Validate a module, checksum its functions and queue its regions
    pub fn add_module(&mut self, module: ModuleInput) -> Result<(), PackError> {
        if module.id == 0 {
            return Err(PackError::Manifest("module id 0 marks an unused slot".into()));
        }
        if self.records.len() == MAX_MODULES {
            return Err(PackError::Manifest(format!(
                "more than {} modules",
                MAX_MODULES
            )));
        }
        if module.functions.len() > MAX_FUNCTIONS {
            return Err(PackError::Manifest(format!(
                "module {} has {} functions, at most {} fit",
                module.id,
                module.functions.len(),
                MAX_FUNCTIONS
            )));
        }

        let got = relocation_bytes(module.got.as_deref(), self.layout.got.size, module.id, "GOT")?;
        let plt = relocation_bytes(module.plt.as_deref(), self.layout.plt.size, module.id, "PLT")?;

        let extent = [
            module.image.len() as u64,
            end_of(self.layout.got.source_offset, got.len()),
            end_of(self.layout.plt.source_offset, plt.len()),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        let declared = match module.declared_size {
            Some(size) => size,
            None => u32::try_from(extent).map_err(|_| {
                PackError::Layout(format!(
                    "module {} does not fit a 32-bit address space",
                    module.id
                ))
            })?,
        };

        let mut record = ModuleRecord::new(module.id, module.address, declared);
        for (index, function) in module.functions.iter().enumerate() {
            let entry = function_record(module.id, index, function, &module.image, declared)?;
            // Count was checked above
            let _ = record.push_function(entry);
        }

        let got_at = offset_address(module.address, self.layout.got.source_offset)?;
        let plt_at = offset_address(module.address, self.layout.plt.source_offset)?;

        self.catalog.push_record(&record)?;
        self.records.push(record);

        let label = |what: &str| format!("module {} {}", module.id, what);
        self.chunks.push((module.address, module.image, label("image")));
        if !got.is_empty() {
            self.chunks.push((got_at, got, label("GOT")));
        }
        if !plt.is_empty() {
            self.chunks.push((plt_at, plt, label("PLT")));
        }

        Ok(())
    }

    /// Lay out the catalog and every queued region
    pub fn finish(self) -> Result<Vec<u8>, PackError> {
        let mut catalog = Vec::with_capacity(CATALOG_SIZE);
        for slot in 0..MAX_MODULES {
            match self.records.get(slot) {
                Some(record) => catalog.extend_from_slice(record.as_bytes()),
                None => catalog.extend_from_slice(ModuleRecord::EMPTY.as_bytes()),
            }
        }

        let mut regions: Vec<(Range<u64>, &[u8], &str)> =
            Vec::with_capacity(self.chunks.len() + 1);
        let catalog_at = u64::from(self.layout.catalog_address);
        regions.push((
            catalog_at..catalog_at + catalog.len() as u64,
            catalog.as_slice(),
            "catalog",
        ));
        for (address, bytes, label) in &self.chunks {
            let start = u64::from(*address);
            regions.push((start..start + bytes.len() as u64, bytes.as_slice(), label.as_str()));
        }

        regions.sort_by_key(|(range, _, _)| range.start);
        for pair in regions.windows(2) {
            let (first, _, first_label) = &pair[0];
            let (second, _, second_label) = &pair[1];
            if second.start < first.end {
                return Err(PackError::Layout(format!(
                    "{} overlaps {} at {:#x}",
                    second_label, first_label, second.start
                )));
            }
        }

        let end = regions.iter().map(|(range, _, _)| range.end).max().unwrap_or(0);
        let mut image = vec![ERASED; end as usize];
        for (range, bytes, _) in &regions {
            image[range.start as usize..range.end as usize].copy_from_slice(bytes);
        }

        Ok(image)
    }

    /// Decoded view of what has been added, as the firmware will see it
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }
}

fn end_of(offset: u32, len: usize) -> u64 {
    if len == 0 {
        0
    } else {
        u64::from(offset) + len as u64
    }
}

fn offset_address(base: u32, offset: u32) -> Result<u32, PackError> {
    base.checked_add(offset)
        .ok_or_else(|| PackError::Layout(format!("{:#x} + {:#x} overflows", base, offset)))
}

/// GOT/PLT source bytes, zero-padded to the layout size
fn relocation_bytes(
    source: Option<&[u8]>,
    size: u32,
    module_id: u32,
    label: &str,
) -> Result<Vec<u8>, PackError> {
    let size = size as usize;
    let source = source.unwrap_or(&[]);
    if source.len() > size {
        return Err(PackError::Layout(format!(
            "module {} {} is {} bytes, the layout reserves {}",
            module_id,
            label,
            source.len(),
            size
        )));
    }
    let mut bytes = source.to_vec();
    bytes.resize(size, 0);
    Ok(bytes)
}

fn function_record(
    module_id: u32,
    index: usize,
    function: &FunctionSpec,
    image: &[u8],
    declared: u32,
) -> Result<FunctionRecord, PackError> {
    let what = |msg: String| {
        PackError::Manifest(format!("module {} `{}`: {}", module_id, function.name, msg))
    };

    if function.name.is_empty() || function.name.len() >= NAME_LEN {
        return Err(what(format!("name must be 1..={} bytes", NAME_LEN - 1)));
    }
    if !function.name.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(what("name must be printable ASCII without spaces".into()));
    }
    if function.size == 0 {
        return Err(what("size is zero".into()));
    }
    if function.size as usize > STAGING_CAPACITY {
        return Err(what(format!(
            "size {} exceeds the {} byte staging buffer",
            function.size, STAGING_CAPACITY
        )));
    }

    let start = function.offset as usize;
    let end = start + function.size as usize;
    if end > image.len() {
        return Err(what(format!(
            "{:#x}..{:#x} is outside the {} byte image",
            start,
            end,
            image.len()
        )));
    }
    if declared != 0 && end as u64 > u64::from(declared) {
        return Err(what(format!("ends past the declared module size {}", declared)));
    }

    let crc = word_crc32(&image[start..end]);
    let record = FunctionRecord::new(
        index as u32,
        &function.name,
        function.offset,
        function.size,
        crc,
    );

    #[cfg(feature = "peripheral-deps")]
    let record = {
        let mut mask = PeripheralMask::empty();
        for name in &function.peripherals {
            match PeripheralMask::from_name(name) {
                Some(bit) => mask.insert(bit),
                None => return Err(what(format!("unknown peripheral `{}`", name))),
            }
        }
        record.with_peripherals(mask)
    };

    #[cfg(not(feature = "peripheral-deps"))]
    if !function.peripherals.is_empty() {
        return Err(what("peripherals need the `peripheral-deps` feature".into()));
    }

    Ok(record)
}
