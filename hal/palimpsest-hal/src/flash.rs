//! Flash transport abstractions
//!
//! Two directions, two traits: modules are *read* from external serial
//! flash, and verified images are *programmed* into internal execution
//! memory. Both are synchronous; the caller owns the buffers.

/// Errors from flash transport operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Bus transfer to the external device failed
    Transport,
    /// Programming internal memory failed
    Program,
    /// Erasing internal memory failed
    Erase,
    /// Address range outside the device or the placement map
    OutOfBounds,
    /// Address or length violates the write granularity
    Misaligned,
}

/// Readable external storage holding the catalog and module images
pub trait SourceFlash {
    /// Fill `buffer` with the bytes starting at `address`
    ///
    /// The read length is the buffer length.
    fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), FlashError>;
}

/// Writable internal memory the loader places code and relocation data into
///
/// Implementations fold unlock, erase and lock into a single call, so a
/// successful `program` leaves `data` readable at `address`.
pub trait ProgramMemory {
    /// Program `data` at `address`
    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError>;
}

impl<T: SourceFlash + ?Sized> SourceFlash for &mut T {
    fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), FlashError> {
        (**self).read(address, buffer)
    }
}

impl<T: ProgramMemory + ?Sized> ProgramMemory for &mut T {
    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        (**self).program(address, data)
    }
}
