//! SPI bus adapter for STM32F4
//!
//! `embassy_stm32::spi::Spi<'_, Blocking>` implements
//! `embedded_hal::spi::SpiBus<u8>`. Chip select stays with the device
//! driver.

use embedded_hal::spi::SpiBus as EhSpiBus;
use palimpsest_hal::SpiBus;

/// Blocking SPI bus adapter
pub struct HalSpi<B> {
    bus: B,
}

impl<B: EhSpiBus<u8>> HalSpi<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B: EhSpiBus<u8>> SpiBus for HalSpi<B> {
    type Error = B::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.bus.write(data)?;
        self.bus.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.bus.read(buf)?;
        self.bus.flush()
    }
}
