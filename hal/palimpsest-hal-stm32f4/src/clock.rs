//! Millisecond clock on the embassy time driver

use embassy_time::{block_for, Duration, Instant};
use palimpsest_hal::Clock;

/// Clock backed by `embassy_time`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        // Truncation is fine; consumers compare with wrapping_sub
        Instant::now().as_millis() as u32
    }

    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }
}
