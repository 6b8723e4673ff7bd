//! Activation input filtering
//!
//! Turns a sampled button level into discrete events: a rising edge more
//! than `debounce_ms` after the previous accepted activation, or an idle
//! timeout once `idle_timeout_ms` has passed without one.

use crate::config::DispatchTiming;

/// Filtered input events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    Activation,
    IdleTimeout,
}

/// Edge detector with debounce and inactivity timeout
#[derive(Debug, Clone)]
pub struct ActivationFilter {
    debounce_ms: u32,
    idle_timeout_ms: u32,
    last_level: bool,
    last_accepted: Option<u32>,
}

impl ActivationFilter {
    pub fn new(timing: &DispatchTiming) -> Self {
        Self {
            debounce_ms: timing.debounce_ms,
            idle_timeout_ms: timing.idle_timeout_ms,
            last_level: false,
            last_accepted: None,
        }
    }

    /// Feed one sample
    ///
    /// `selecting` gates the timeout: it only fires mid-selection.
    /// Timestamps may wrap.
    pub fn update(&mut self, now_ms: u32, pressed: bool, selecting: bool) -> Option<InputEvent> {
        let rising = pressed && !self.last_level;
        self.last_level = pressed;

        let elapsed = self.last_accepted.map(|t| now_ms.wrapping_sub(t));

        if rising {
            match elapsed {
                Some(e) if e <= self.debounce_ms => {}
                _ => {
                    self.last_accepted = Some(now_ms);
                    return Some(InputEvent::Activation);
                }
            }
        }

        match elapsed {
            Some(e) if selecting && e > self.idle_timeout_ms => Some(InputEvent::IdleTimeout),
            _ => None,
        }
    }
}
