//! Timer-driven debounce state machine shared by the tap sensor and the buttons.
//!
//! A [`Debouncer`] is fed one sample per control-loop iteration together with the
//! current instant. It never blocks:
//!
//! ```text
//!            asserted                 held >= settle
//!   Armed ------------> Confirming --------------------> Fired  (reports once)
//!     ^                     |                              |
//!     |   released early    |                     released |
//!     +---------------------+                              v
//!     +------------------------------------------------ Released
//!               released >= release time    (re-assert -> Fired, no report)
//! ```
//!
//! One report per physical assertion; glitches shorter than the settle time are
//! dropped, at the cost of missing genuinely short pulses.

use embedded_hal::digital::InputPin;

use crate::logging::Dbg;
use crate::time::TimeInstant;

/// Electrical level at which an input line counts as asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    Low,
    High,
}

impl ActiveLevel {
    /// Samples `pin`. A read error is logged and reported as not asserted.
    pub fn is_asserted<P: InputPin>(self, pin: &mut P) -> bool {
        let reading = match self {
            ActiveLevel::Low => pin.is_low(),
            ActiveLevel::High => pin.is_high(),
        };

        match reading {
            Ok(asserted) => asserted,
            Err(e) => {
                warn!("input read failed: {:?}", Dbg(&e));
                false
            }
        }
    }
}

/// Settle and release times of a [`Debouncer`], in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceConfig {
    /// Minimum assertion time before a report. Zero reports on the first asserted sample.
    pub settle_ms: u64,
    /// Minimum release time before re-arming. Zero re-arms on the first released sample.
    pub release_ms: u64,
}

/// Observable phase of a [`Debouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebouncePhase {
    /// Waiting for an assertion.
    Armed,
    /// Asserted, settle time not yet reached.
    Confirming,
    /// Reported; waiting for the line to be released.
    Fired,
    /// Released; waiting for the release time before re-arming.
    Released,
}

#[derive(Clone, Copy)]
enum Phase<I> {
    Armed,
    Confirming { since: I },
    Fired,
    Released { since: I },
}

/// Debounce state machine over an abstract instant type.
pub struct Debouncer<I: TimeInstant> {
    config: DebounceConfig,
    phase: Phase<I>,
}

impl<I: TimeInstant> Debouncer<I> {
    /// Creates an armed debouncer (the line is assumed released).
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            phase: Phase::Armed,
        }
    }

    /// Feeds one sample taken at `now`.
    ///
    /// Returns `true` exactly once per accepted assertion.
    pub fn update(&mut self, asserted: bool, now: I) -> bool {
        match self.phase {
            Phase::Armed => {
                if asserted {
                    self.phase = Phase::Confirming { since: now };
                    return self.confirm(now);
                }
            }
            Phase::Confirming { .. } => {
                if asserted {
                    return self.confirm(now);
                }
                self.phase = Phase::Armed;
            }
            Phase::Fired => {
                if !asserted {
                    self.phase = Phase::Released { since: now };
                    self.rearm(now);
                }
            }
            Phase::Released { .. } => {
                if asserted {
                    self.phase = Phase::Fired;
                } else {
                    self.rearm(now);
                }
            }
        }
        false
    }

    fn confirm(&mut self, now: I) -> bool {
        if let Phase::Confirming { since } = self.phase {
            if now.millis_since(since) >= self.config.settle_ms {
                self.phase = Phase::Fired;
                return true;
            }
        }
        false
    }

    fn rearm(&mut self, now: I) {
        if let Phase::Released { since } = self.phase {
            if now.millis_since(since) >= self.config.release_ms {
                self.phase = Phase::Armed;
            }
        }
    }

    pub fn phase(&self) -> DebouncePhase {
        match self.phase {
            Phase::Armed => DebouncePhase::Armed,
            Phase::Confirming { .. } => DebouncePhase::Confirming,
            Phase::Fired => DebouncePhase::Fired,
            Phase::Released { .. } => DebouncePhase::Released,
        }
    }
}
