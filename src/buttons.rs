//! Brightness buttons and the brightness adjuster.

use embedded_hal::digital::InputPin;

use crate::command::Brightness;
use crate::config::ControllerConfig;
use crate::debounce::{ActiveLevel, DebounceConfig, DebouncePhase, Debouncer};
use crate::led::{LedEngine, LedError, LedStrip};
use crate::time::TimeInstant;

/// Which brightness button fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonAction {
    Increase,
    Decrease,
}

/// Presses detected by one [`BrightnessButtons::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonPresses {
    pub increase: bool,
    pub decrease: bool,
}

impl ButtonPresses {
    /// Actions in processing order: increase before decrease.
    pub fn actions(self) -> impl Iterator<Item = ButtonAction> {
        let increase = self.increase.then_some(ButtonAction::Increase);
        let decrease = self.decrease.then_some(ButtonAction::Decrease);
        increase.into_iter().chain(decrease)
    }

    pub fn any(self) -> bool {
        self.increase || self.decrease
    }
}

/// Result of one brightness adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Adjustment {
    /// Global brightness after the step.
    pub brightness: Brightness,
    /// Whether the last command was re-rendered at the new brightness.
    pub reapplied: bool,
}

/// One active-low push button with edge detection.
struct Button<P: InputPin, I: TimeInstant> {
    pin: P,
    debouncer: Debouncer<I>,
}

impl<P: InputPin, I: TimeInstant> Button<P, I> {
    fn pressed(&mut self, now: I) -> bool {
        let level = ActiveLevel::Low.is_asserted(&mut self.pin);
        self.debouncer.update(level, now)
    }
}

/// The increase/decrease button pair.
pub struct BrightnessButtons<P: InputPin, I: TimeInstant> {
    increase: Button<P, I>,
    decrease: Button<P, I>,
    step: u8,
}

impl<P: InputPin, I: TimeInstant> BrightnessButtons<P, I> {
    /// Creates the pair; `step` is the brightness change per press in percent.
    pub fn new(increase: P, decrease: P, debounce: DebounceConfig, step: u8) -> Self {
        Self {
            increase: Button {
                pin: increase,
                debouncer: Debouncer::new(debounce),
            },
            decrease: Button {
                pin: decrease,
                debouncer: Debouncer::new(debounce),
            },
            step,
        }
    }

    pub fn from_config(increase: P, decrease: P, config: &ControllerConfig) -> Self {
        Self::new(increase, decrease, config.button, config.brightness_step)
    }

    /// Samples both buttons once; a press is reported on its release-to-press edge only.
    pub fn poll(&mut self, now: I) -> ButtonPresses {
        ButtonPresses {
            increase: self.increase.pressed(now),
            decrease: self.decrease.pressed(now),
        }
    }

    /// Polls both buttons and applies every detected press to `engine`.
    ///
    /// Returns the last adjustment made, if any button fired.
    pub fn poll_and_adjust<S: LedStrip, const N: usize>(
        &mut self,
        now: I,
        engine: &mut LedEngine<S, N>,
    ) -> Option<Adjustment> {
        let mut last = None;
        for action in self.poll(now).actions() {
            let adjustment = match adjust(engine, action, self.step) {
                Ok(adjustment) => adjustment,
                Err(_) => Adjustment {
                    brightness: engine.brightness(),
                    reapplied: false,
                },
            };
            last = Some(adjustment);
        }
        last
    }

    /// Debounce phases of the (increase, decrease) buttons.
    pub fn phases(&self) -> (DebouncePhase, DebouncePhase) {
        (
            self.increase.debouncer.phase(),
            self.decrease.debouncer.phase(),
        )
    }

    pub fn step(&self) -> u8 {
        self.step
    }
}

/// Steps the global brightness and re-renders the last command at the new level.
///
/// Without a previous command only the brightness changes. Otherwise a copy of the
/// last command with just its brightness replaced is applied, so mode and hue are
/// preserved.
///
/// # Errors
/// Whatever [`LedEngine::apply`] reports for the re-rendered command; the new
/// brightness is kept either way.
pub fn adjust<S: LedStrip, const N: usize>(
    engine: &mut LedEngine<S, N>,
    action: ButtonAction,
    step: u8,
) -> Result<Adjustment, LedError> {
    let current = engine.brightness();
    let brightness = match action {
        ButtonAction::Increase => current.raised(step),
        ButtonAction::Decrease => current.lowered(step),
    };
    engine.set_brightness(brightness);
    info!("brightness {:?}: {} -> {}", action, current.percent(), brightness.percent());

    let Some(last) = engine.last_command() else {
        info!("no LED command to re-apply yet");
        return Ok(Adjustment {
            brightness,
            reapplied: false,
        });
    };

    engine.apply(&last.with_brightness(brightness.percent()))?;
    Ok(Adjustment {
        brightness,
        reapplied: true,
    })
}
