//! Timing and brightness configuration.

use crate::command::Brightness;
use crate::debounce::{ActiveLevel, DebounceConfig};

/// Time a tap must hold the vibration line before it counts (ms).
pub const TAP_SETTLE_MS: u64 = 2;

/// Time the vibration line must stay released before the next tap can start (ms).
pub const TAP_RELEASE_MS: u64 = 1;

/// Hold-off after a button press that absorbs mechanical bounce (ms).
pub const BUTTON_BOUNCE_MS: u64 = 50;

/// Delay between the steps of the startup sweep (ms).
pub const SWEEP_STEP_MS: u32 = 50;

/// Brightness change per button press, in percent.
pub const BRIGHTNESS_STEP: u8 = 10;

/// Brightness at power-up, in percent.
pub const INITIAL_BRIGHTNESS: u8 = 100;

/// Tunables for one controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Debounce of the vibration line.
    pub tap: DebounceConfig,
    /// Level at which the vibration line reports a tap.
    pub tap_active_level: ActiveLevel,
    /// Debounce of each brightness button (buttons are always active-low).
    pub button: DebounceConfig,
    /// Percent added or removed per button press.
    pub brightness_step: u8,
    /// Global brightness before any command arrives.
    pub initial_brightness: Brightness,
    /// Delay between startup sweep steps.
    pub sweep_step_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tap: DebounceConfig {
                settle_ms: TAP_SETTLE_MS,
                release_ms: TAP_RELEASE_MS,
            },
            tap_active_level: ActiveLevel::Low,
            button: DebounceConfig {
                settle_ms: 0,
                release_ms: BUTTON_BOUNCE_MS,
            },
            brightness_step: BRIGHTNESS_STEP,
            initial_brightness: Brightness::new(INITIAL_BRIGHTNESS),
            sweep_step_ms: SWEEP_STEP_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_hardware_timing() {
        let config = ControllerConfig::default();

        assert_eq!(config.tap.settle_ms, 2);
        assert_eq!(config.tap.release_ms, 1);
        assert_eq!(config.button.settle_ms, 0);
        assert_eq!(config.button.release_ms, 50);
        assert_eq!(config.initial_brightness, Brightness::MAX);
        assert_eq!(config.tap_active_level, ActiveLevel::Low);
    }
}
