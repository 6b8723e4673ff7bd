//! UART adapter for STM32F4
//!
//! The console only transmits, so any `embedded_io::Write` will do
//! (`embassy_stm32::usart::UartTx<'_, Blocking>` in the firmware).

use embedded_io::Write;
use palimpsest_hal::UartTx;

/// UART configuration
#[derive(Debug, Clone, Copy)]
pub struct UartConfig {
    /// Baud rate
    pub baudrate: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self { baudrate: 115_200 }
    }
}

/// Blocking UART transmit adapter
pub struct HalUart<W> {
    tx: W,
}

impl<W: Write> HalUart<W> {
    pub fn new(tx: W) -> Self {
        Self { tx }
    }
}

impl<W: Write> UartTx for HalUart<W> {
    type Error = W::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.flush()
    }
}
