//! Integrity checksum abstraction

/// 32-bit checksum over a byte range
///
/// Implementations must reset their internal state before every
/// computation, and must match the algorithm the image builder used to
/// fill the catalog's `crc` fields.
pub trait ChecksumEngine {
    /// Compute the checksum of `data`
    fn checksum(&mut self, data: &[u8]) -> u32;
}

impl<T: ChecksumEngine + ?Sized> ChecksumEngine for &mut T {
    fn checksum(&mut self, data: &[u8]) -> u32 {
        (**self).checksum(data)
    }
}
