//! Vibration (tap) sensor with debounced event counting.

use embedded_hal::digital::InputPin;

use crate::config::ControllerConfig;
use crate::debounce::{ActiveLevel, DebounceConfig, DebouncePhase, Debouncer};
use crate::time::TimeInstant;

/// Counts discrete taps on a polled sensor line.
///
/// The counter only grows (wrapping at `u32::MAX`). Detecting that a new tap
/// happened is up to the caller, by comparing against a snapshot it keeps.
pub struct TapSensor<P: InputPin, I: TimeInstant> {
    line: P,
    active: ActiveLevel,
    debouncer: Debouncer<I>,
    events: u32,
}

impl<P: InputPin, I: TimeInstant> TapSensor<P, I> {
    pub fn new(line: P, active: ActiveLevel, debounce: DebounceConfig) -> Self {
        Self {
            line,
            active,
            debouncer: Debouncer::new(debounce),
            events: 0,
        }
    }

    /// Builds a sensor with the tap timing and active level from `config`.
    pub fn from_config(line: P, config: &ControllerConfig) -> Self {
        Self::new(line, config.tap_active_level, config.tap)
    }

    /// Samples the line once and returns the event counter.
    pub fn poll(&mut self, now: I) -> u32 {
        let asserted = self.active.is_asserted(&mut self.line);
        if self.debouncer.update(asserted, now) {
            self.events = self.events.wrapping_add(1);
            debug!("tap #{}", self.events);
        }
        self.events
    }

    /// Number of taps counted so far.
    pub fn events(&self) -> u32 {
        self.events
    }

    /// `true` while a counted tap is still holding the line (or settling after it).
    pub fn is_latched(&self) -> bool {
        matches!(
            self.debouncer.phase(),
            DebouncePhase::Fired | DebouncePhase::Released
        )
    }

    pub fn phase(&self) -> DebouncePhase {
        self.debouncer.phase()
    }

    /// Gives the line back, e.g. to reconfigure it.
    pub fn release(self) -> P {
        self.line
    }
}
