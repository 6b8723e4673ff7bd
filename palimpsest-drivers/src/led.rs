//! Status LED
//!
//! Single GPIO indicator used for selection feedback and failure blinks.
//! Boards wire it either way, so polarity is a constructor choice.

use palimpsest_hal::OutputPin;

/// Status LED on a GPIO pin
pub struct StatusLed<P> {
    pin: P,
    /// If true, LED on = pin low
    inverted: bool,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Create an LED driver, initially off
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut led = Self {
            pin,
            inverted,
            on: false,
        };
        led.set_on(false);
        led
    }

    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, true)
    }

    pub fn set_on(&mut self, on: bool) {
        self.on = on;
        self.pin.set_state(on != self.inverted);
    }

    pub fn toggle(&mut self) {
        self.set_on(!self.on);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockPin {
        high: bool,
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn test_active_high_led() {
        let mut led = StatusLed::new_active_high(MockPin { high: true });
        assert!(!led.is_on());
        assert!(!led.pin.is_set_high());

        led.set_on(true);
        assert!(led.pin.is_set_high());
    }

    #[test]
    fn test_active_low_led() {
        let mut led = StatusLed::new_active_low(MockPin { high: false });
        assert!(!led.is_on());
        assert!(led.pin.is_set_high());

        led.set_on(true);
        assert!(led.is_on());
        assert!(!led.pin.is_set_high());
    }

    #[test]
    fn test_toggle() {
        let mut led = StatusLed::new_active_high(MockPin { high: false });
        led.toggle();
        assert!(led.is_on());
        led.toggle();
        assert!(!led.is_on());
        assert!(!led.pin.is_set_high());
    }
}
