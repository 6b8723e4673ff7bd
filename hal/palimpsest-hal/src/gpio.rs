//! Digital pin abstractions
//!
//! The loader needs one output (status LED, NOR chip select) and one input
//! (activation button). Levels are electrical; use [`ActiveLow`] to turn
//! them into logical states.

/// Push-pull output
pub trait OutputPin {
    /// Drive the pin to logic 1
    fn set_high(&mut self);

    /// Drive the pin to logic 0
    fn set_low(&mut self);

    /// Drive the pin to `high`
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Level last driven
    fn is_set_high(&self) -> bool;
}

/// Sampled input
///
/// Takes `&mut self` because some chip HALs need exclusive access to
/// sample the input register.
pub trait InputPin {
    /// Sample the pin; `true` for logic 1
    fn is_high(&mut self) -> bool;

    /// Sample the pin; `true` for logic 0
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}

/// Inverting adapter for active-low wiring
///
/// Wraps a pin so that "high" means "asserted" to the caller regardless of
/// how the board wires it. The status LED and the activation button on the
/// reference boards are both active-low.
#[derive(Debug)]
pub struct ActiveLow<P>(pub P);

impl<P: OutputPin> OutputPin for ActiveLow<P> {
    fn set_high(&mut self) {
        self.0.set_low();
    }

    fn set_low(&mut self) {
        self.0.set_high();
    }

    fn is_set_high(&self) -> bool {
        !self.0.is_set_high()
    }
}

impl<P: InputPin> InputPin for ActiveLow<P> {
    fn is_high(&mut self) -> bool {
        self.0.is_low()
    }
}
