//! UART serial output abstraction
//!
//! The loader only ever talks *to* the user, so only the transmit half
//! is modelled.

/// UART transmitter
pub trait UartTx {
    type Error;

    /// Queue `data` for transmission, returning once all of it is accepted
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Wait until the last queued byte has left the shift register
    fn flush(&mut self) -> Result<(), Self::Error>;
}
