//! Board services shared by the dispatcher and loaded code
//!
//! The dispatcher prints selection messages and blinks the LED; loaded code
//! does the same through the capability table. Both paths go through one
//! [`BoardServices`] so output stays ordered.

use palimpsest_hal::{OutputPin, UartTx};

use crate::console::UartConsole;
use crate::led::StatusLed;
use crate::log::warn;

/// Console and indicator of one board
pub struct BoardServices<U, P> {
    console: UartConsole<U>,
    led: StatusLed<P>,
}

impl<U: UartTx, P: OutputPin> BoardServices<U, P> {
    pub fn new(console: UartConsole<U>, led: StatusLed<P>) -> Self {
        Self { console, led }
    }

    /// Print one line; transmit errors are logged and dropped
    pub fn print_line(&mut self, text: &str) {
        if self.console.write_line(text).is_err() {
            warn!("console: write failed");
        }
    }

    /// Print untrusted text as-is, sanitized
    pub fn print_raw(&mut self, bytes: &[u8]) {
        if self.console.write_bytes_lossy(bytes).is_err() {
            warn!("console: write failed");
        }
    }

    pub fn set_indicator(&mut self, on: bool) {
        self.led.set_on(on);
    }

    pub fn console(&mut self) -> &mut UartConsole<U> {
        &mut self.console
    }

    pub fn led(&mut self) -> &mut StatusLed<P> {
        &mut self.led
    }
}
