//! Winbond W25Qxx SPI NOR flash
//!
//! Read-only use: the module catalog and images are written by an external
//! programmer, the firmware only reads them back.
//!
//! # Protocol
//!
//! ```text
//! READ DATA   CS↓ 0x03 A23..A16 A15..A8 A7..A0 [data...] CS↑
//! JEDEC ID    CS↓ 0x9F [manufacturer] [type] [capacity]   CS↑
//! ```
//!
//! The plain READ command has no dummy cycles and works at any clock the
//! part supports below 50 MHz.

use palimpsest_hal::{FlashError, OutputPin, SourceFlash, SpiBus};

use crate::log::{debug, warn};

/// Command bytes
pub mod cmd {
    pub const READ_DATA: u8 = 0x03;
    pub const JEDEC_ID: u8 = 0x9F;
}

/// Largest address the 3-byte READ command can reach
pub const ADDRESS_LIMIT: u32 = 1 << 24;

/// JEDEC identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JedecId {
    pub manufacturer: u8,
    pub memory_type: u8,
    pub capacity: u8,
}

impl JedecId {
    pub const WINBOND: u8 = 0xEF;

    /// Device size in bytes, from the capacity code (2^code)
    pub fn capacity_bytes(&self) -> Option<u32> {
        1u32.checked_shl(u32::from(self.capacity))
    }
}

/// W25Qxx driver over a SPI bus and a chip-select pin
pub struct W25q<SPI, CS> {
    spi: SPI,
    cs: CS,
    capacity: u32,
}

impl<SPI: SpiBus, CS: OutputPin> W25q<SPI, CS> {
    /// Create a driver for a device of `capacity` bytes
    ///
    /// Capacity is clamped to what 24-bit addressing reaches.
    pub fn new(spi: SPI, mut cs: CS, capacity: u32) -> Self {
        cs.set_high();
        Self {
            spi,
            cs,
            capacity: capacity.min(ADDRESS_LIMIT),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Read the JEDEC id
    pub fn jedec_id(&mut self) -> Result<JedecId, FlashError> {
        let mut id = [0u8; 3];
        self.transaction(&[cmd::JEDEC_ID], &mut id)?;
        debug!("w25q: jedec id {:x}", id);
        Ok(JedecId {
            manufacturer: id[0],
            memory_type: id[1],
            capacity: id[2],
        })
    }

    /// Release the bus and chip select
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    /// One CS-framed command: write `header`, then read into `data`
    ///
    /// CS is released even when the bus fails.
    fn transaction(&mut self, header: &[u8], data: &mut [u8]) -> Result<(), FlashError> {
        self.cs.set_low();
        let result = self
            .spi
            .write(header)
            .and_then(|_| self.spi.read(data));
        self.cs.set_high();

        result.map_err(|_| {
            warn!("w25q: spi transfer failed");
            FlashError::Transport
        })
    }
}

impl<SPI: SpiBus, CS: OutputPin> SourceFlash for W25q<SPI, CS> {
    fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), FlashError> {
        let end = address
            .checked_add(buffer.len() as u32)
            .ok_or(FlashError::OutOfBounds)?;
        if end > self.capacity {
            return Err(FlashError::OutOfBounds);
        }
        if buffer.is_empty() {
            return Ok(());
        }

        let [_, a2, a1, a0] = address.to_be_bytes();
        self.transaction(&[cmd::READ_DATA, a2, a1, a0], buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        CsLow,
        CsHigh,
        Write(Vec<u8>),
        Read(usize),
    }

    type Log = Rc<RefCell<Vec<Op>>>;

    /// SPI device that answers reads from a fixed response and logs traffic
    struct MockSpi {
        log: Log,
        response: Vec<u8>,
        fail: bool,
    }

    impl SpiBus for MockSpi {
        type Error = ();

        fn write(&mut self, data: &[u8]) -> Result<(), ()> {
            self.log.borrow_mut().push(Op::Write(data.to_vec()));
            if self.fail {
                Err(())
            } else {
                Ok(())
            }
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<(), ()> {
            self.log.borrow_mut().push(Op::Read(buf.len()));
            for (dst, src) in buf.iter_mut().zip(self.response.iter().cycle()) {
                *dst = *src;
            }
            Ok(())
        }
    }

    struct MockCs {
        log: Log,
        high: bool,
    }

    impl OutputPin for MockCs {
        fn set_high(&mut self) {
            self.high = true;
            self.log.borrow_mut().push(Op::CsHigh);
        }

        fn set_low(&mut self) {
            self.high = false;
            self.log.borrow_mut().push(Op::CsLow);
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    fn device(response: &[u8], capacity: u32) -> (W25q<MockSpi, MockCs>, Log) {
        let log: Log = Rc::default();
        let spi = MockSpi {
            log: log.clone(),
            response: response.to_vec(),
            fail: false,
        };
        let cs = MockCs {
            log: log.clone(),
            high: false,
        };
        let flash = W25q::new(spi, cs, capacity);
        log.borrow_mut().clear();
        (flash, log)
    }

    #[test]
    fn test_read_command_framing() {
        let (mut flash, log) = device(&[0xAB], 0x40_0000);
        let mut buf = [0u8; 4];
        flash.read(0x12_3456, &mut buf).unwrap();

        assert_eq!(buf, [0xAB; 4]);
        assert_eq!(
            *log.borrow(),
            [
                Op::CsLow,
                Op::Write(vec![0x03, 0x12, 0x34, 0x56]),
                Op::Read(4),
                Op::CsHigh
            ]
        );
    }

    #[test]
    fn test_jedec_id() {
        let (mut flash, log) = device(&[0xEF, 0x40, 0x16], 0x40_0000);
        let id = flash.jedec_id().unwrap();

        assert_eq!(id.manufacturer, JedecId::WINBOND);
        assert_eq!(id.capacity_bytes(), Some(0x40_0000));
        assert_eq!(log.borrow()[1], Op::Write(vec![0x9F]));
    }

    #[test]
    fn test_out_of_bounds_read_rejected_without_traffic() {
        let (mut flash, log) = device(&[0], 0x1000);
        let mut buf = [0u8; 16];
        assert_eq!(flash.read(0xFF8, &mut buf), Err(FlashError::OutOfBounds));
        assert_eq!(flash.read(u32::MAX, &mut buf), Err(FlashError::OutOfBounds));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_bus_error_releases_cs() {
        let (flash, log) = device(&[0], 0x1000);
        let (mut spi, cs) = flash.release();
        spi.fail = true;
        let mut flash = W25q::new(spi, cs, 0x1000);
        log.borrow_mut().clear();

        let mut buf = [0u8; 2];
        assert_eq!(flash.read(0, &mut buf), Err(FlashError::Transport));
        assert_eq!(log.borrow().last(), Some(&Op::CsHigh));
        let (_, cs) = flash.release();
        assert!(cs.is_set_high());
    }

    #[test]
    fn test_capacity_clamped_to_24_bit() {
        let (flash, _) = device(&[0], u32::MAX);
        assert_eq!(flash.capacity(), ADDRESS_LIMIT);
    }
}
