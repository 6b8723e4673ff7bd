//! Time source abstraction
//!
//! The dispatcher runs a single cooperative poll loop, so all it needs is
//! a monotonically increasing millisecond counter and a blocking delay.

/// Millisecond clock
pub trait Clock {
    /// Milliseconds since boot
    ///
    /// Wraps at `u32::MAX`; consumers compare with `wrapping_sub`.
    fn now_ms(&self) -> u32;

    /// Busy-wait for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}
