//! GPIO adapters for STM32F4
//!
//! `embassy_stm32::gpio::{Output, Input}` implement the embedded-hal 1.0
//! digital traits; these wrappers present them as `palimpsest-hal` pins.

use embedded_hal::digital::{InputPin as EhInputPin, OutputPin as EhOutputPin};
use palimpsest_hal::{InputPin, OutputPin};

/// Output pin adapter
///
/// Tracks the driven level itself so `is_set_high` can stay `&self`.
pub struct HalOutput<P> {
    pin: P,
    high: bool,
}

impl<P: EhOutputPin> HalOutput<P> {
    /// Wrap a pin and drive it to `initial_high`
    pub fn new(mut pin: P, initial_high: bool) -> Self {
        // GPIO writes on this family cannot fail
        let _ = if initial_high {
            pin.set_high()
        } else {
            pin.set_low()
        };
        Self {
            pin,
            high: initial_high,
        }
    }
}

impl<P: EhOutputPin> OutputPin for HalOutput<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Input pin adapter
pub struct HalInput<P> {
    pin: P,
}

impl<P: EhInputPin> HalInput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: EhInputPin> InputPin for HalInput<P> {
    fn is_high(&mut self) -> bool {
        self.pin.is_high().unwrap_or(false)
    }
}
