//! Function loader
//!
//! Fetch, verify, place. Everything that can fail without side effects is
//! done first:
//!
//! ```text
//!  capacity checks ──► read image ──► checksum ──► read GOT/PLT sources
//!                                                          │
//!        window ◄── program image ◄─────────────────────────┘
//!        GOT    ◄── program GOT
//!        PLT    ◄── program PLT
//! ```
//!
//! A failure anywhere before the first `program` call leaves the window,
//! GOT and PLT untouched. There is no retry here; that is the
//! dispatcher's call.

use palimpsest_hal::{ChecksumEngine, FlashError, ProgramMemory, SourceFlash};

use crate::catalog::ModuleInfo;
use crate::config::{LoaderLayout, RelocationKind};
use crate::log::{debug, warn};

/// Staging buffer size; the largest code image that can be loaded
pub const STAGING_CAPACITY: usize = 1024;

/// Largest GOT or PLT region
pub const RELOCATION_CAPACITY: usize = 256;

/// Load failures, by stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// Function index past the module's function count
    NoSuchFunction { index: usize, count: usize },
    /// Image does not fit the staging buffer or window
    OversizedImage { size: u32, capacity: u32 },
    /// Zero-length image
    EmptyImage,
    /// Image extends past the module's declared size
    OutOfModuleBounds { end: u32, image_size: u32 },
    /// GOT or PLT region larger than its staging buffer
    RelocationOversized {
        region: RelocationKind,
        size: u32,
        capacity: u32,
    },
    /// Fetched bytes do not match the catalog checksum
    IntegrityFailure { expected: u32, actual: u32 },
    /// Reading external flash failed
    Transport(FlashError),
    /// Writing internal memory failed
    Placement(FlashError),
}

/// Something that can load a catalog function into the execution window
///
/// The dispatcher depends on this rather than on [`Loader`] so it can be
/// driven without real flash.
pub trait FunctionLoader {
    /// Load function `index` (0-based) of `module`
    fn load_function(&mut self, module: &ModuleInfo, index: usize) -> Result<(), LoadError>;

    /// Placement map in use
    fn layout(&self) -> &LoaderLayout;
}

impl<T: FunctionLoader + ?Sized> FunctionLoader for &mut T {
    fn load_function(&mut self, module: &ModuleInfo, index: usize) -> Result<(), LoadError> {
        (**self).load_function(module, index)
    }

    fn layout(&self) -> &LoaderLayout {
        (**self).layout()
    }
}

/// Loader over a source flash, a placement target and a checksum engine
pub struct Loader<S, P, C> {
    source: S,
    target: P,
    checksum: C,
    layout: LoaderLayout,
    staging: [u8; STAGING_CAPACITY],
    got: [u8; RELOCATION_CAPACITY],
    plt: [u8; RELOCATION_CAPACITY],
}

impl<S, P, C> Loader<S, P, C>
where
    S: SourceFlash,
    P: ProgramMemory,
    C: ChecksumEngine,
{
    pub fn new(source: S, target: P, checksum: C, layout: LoaderLayout) -> Self {
        Self {
            source,
            target,
            checksum,
            layout,
            staging: [0; STAGING_CAPACITY],
            got: [0; RELOCATION_CAPACITY],
            plt: [0; RELOCATION_CAPACITY],
        }
    }

    /// Largest image this loader accepts
    pub fn capacity(&self) -> u32 {
        (STAGING_CAPACITY as u32).min(self.layout.window_size)
    }

    /// Split back into parts
    pub fn release(self) -> (S, P, C) {
        (self.source, self.target, self.checksum)
    }

    fn check_relocation(&self, kind: RelocationKind) -> Result<usize, LoadError> {
        let size = self.layout.region(kind).size;
        if size as usize > RELOCATION_CAPACITY {
            return Err(LoadError::RelocationOversized {
                region: kind,
                size,
                capacity: RELOCATION_CAPACITY as u32,
            });
        }
        Ok(size as usize)
    }
}

impl<S, P, C> FunctionLoader for Loader<S, P, C>
where
    S: SourceFlash,
    P: ProgramMemory,
    C: ChecksumEngine,
{
    fn load_function(&mut self, module: &ModuleInfo, index: usize) -> Result<(), LoadError> {
        let function = module.function(index).ok_or(LoadError::NoSuchFunction {
            index,
            count: module.function_count(),
        })?;

        let size = function.size;
        let capacity = self.capacity();
        if size > capacity {
            warn!("load: image {} bytes exceeds {}", size, capacity);
            return Err(LoadError::OversizedImage { size, capacity });
        }
        if size == 0 {
            return Err(LoadError::EmptyImage);
        }
        if module.image_size != 0 {
            let end = function.offset.saturating_add(size);
            if end > module.image_size {
                return Err(LoadError::OutOfModuleBounds {
                    end,
                    image_size: module.image_size,
                });
            }
        }
        let got_len = self.check_relocation(RelocationKind::Got)?;
        let plt_len = self.check_relocation(RelocationKind::Plt)?;

        let len = size as usize;
        let image = &mut self.staging[..len];
        self.source
            .read(module.base_address.wrapping_add(function.offset), image)
            .map_err(LoadError::Transport)?;

        let actual = self.checksum.checksum(image);
        if actual != function.checksum {
            warn!(
                "load: checksum mismatch, expected {=u32:#x} got {=u32:#x}",
                function.checksum,
                actual
            );
            return Err(LoadError::IntegrityFailure {
                expected: function.checksum,
                actual,
            });
        }

        let got = self.layout.got;
        let plt = self.layout.plt;
        self.source
            .read(
                module.base_address.wrapping_add(got.source_offset),
                &mut self.got[..got_len],
            )
            .map_err(LoadError::Transport)?;
        self.source
            .read(
                module.base_address.wrapping_add(plt.source_offset),
                &mut self.plt[..plt_len],
            )
            .map_err(LoadError::Transport)?;

        self.target
            .program(self.layout.window_address, &self.staging[..len])
            .map_err(LoadError::Placement)?;
        self.target
            .program(got.target_address, &self.got[..got_len])
            .map_err(LoadError::Placement)?;
        self.target
            .program(plt.target_address, &self.plt[..plt_len])
            .map_err(LoadError::Placement)?;

        debug!(
            "load: module {} function {} placed ({} bytes)",
            module.module_id,
            index,
            size
        );
        Ok(())
    }

    fn layout(&self) -> &LoaderLayout {
        &self.layout
    }
}
