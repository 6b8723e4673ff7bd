//! SPI bus abstraction
//!
//! Only what a command/response NOR device needs. Chip select is not part
//! of the bus; devices drive their own select line through
//! [`crate::gpio::OutputPin`].

/// Blocking SPI master
pub trait SpiBus {
    type Error;

    /// Clock out `data`, discarding what comes back
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Clock in `buf.len()` bytes; the bytes sent are unspecified
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;
}
