//! Control state machine and scheduler loop.
//!
//! [`Controller`] owns every piece of state that the control loop writes: the FSM
//! state, the LED engine (and with it brightness and the last command), the tap
//! sensor, the buttons and the connection status line. The BLE context only
//! reaches it through [`SharedState`], so each iteration of [`Controller::step`]
//! sees a consistent snapshot of remote input.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};
use palette::Srgb;

use crate::buttons::BrightnessButtons;
use crate::command::{LedCommand, LightMode, Rgb8};
use crate::led::{LedEngine, LedError, LedStrip};
use crate::logging::Dbg;
use crate::shared::SharedState;
use crate::time::{TimeInstant, TimeSource};
use crate::vibration::TapSensor;

/// RGB used by direct-mode taps before any command has been applied.
pub const TAP_DEFAULT_COLOR: Rgb8 = Srgb::new(255, 255, 255);

/// Trait for abstracting the BLE advertiser.
pub trait Advertiser {
    type Error: core::fmt::Debug;

    /// Starts connectable advertising. Called once per visit to `Advertising`.
    fn start_advertising(&mut self) -> Result<(), Self::Error>;
}

/// States of the control FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlState {
    /// Polling inputs and waiting for work.
    Idle,
    /// About to issue one advertisement-start request. Initial state.
    Advertising,
    /// Applying exactly one LED update.
    LedControl,
    /// Configuration session active; only the buttons are serviced.
    MotorConfig,
}

/// Where the LED update of a `LedControl` visit comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateSource {
    /// Newest command in the BLE mailbox.
    Remote,
    /// Preset selected by a tap.
    Tap,
}

#[derive(Clone, Copy)]
enum Pending {
    Remote,
    Tap(LedCommand),
}

/// Counters kept by the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerStats {
    /// LED updates attempted from `LedControl`.
    pub led_updates: u32,
    /// Taps that triggered an LED update.
    pub taps_applied: u32,
    /// Motor characteristic writes observed.
    pub motor_commands: u32,
}

/// The control loop.
///
/// # Type Parameters
/// * `'a` - Lifetime of the shared state and time source references
/// * `I` - Time instant type
/// * `T` - Time source implementation type
/// * `S` - LED strip implementation type
/// * `V` - Vibration sensor input pin type
/// * `B` - Brightness button input pin type
/// * `L` - Connection status output pin type
/// * `A` - Advertiser implementation type
/// * `N` - Number of pixels on the strip
pub struct Controller<'a, I, T, S, V, B, L, A, const N: usize>
where
    I: TimeInstant,
    T: TimeSource<I>,
    S: LedStrip,
    V: InputPin,
    B: InputPin,
    L: OutputPin,
    A: Advertiser,
{
    shared: &'a SharedState,
    clock: &'a T,
    engine: LedEngine<S, N>,
    taps: TapSensor<V, I>,
    buttons: BrightnessButtons<B, I>,
    status: L,
    status_shown: Option<bool>,
    advertiser: A,
    state: ControlState,
    pending: Option<Pending>,
    seen_command: u32,
    seen_taps: u32,
    next_tap_mode: usize,
    last_update: Option<(UpdateSource, Result<Rgb8, LedError>)>,
    stats: ControllerStats,
}

impl<'a, I, T, S, V, B, L, A, const N: usize> Controller<'a, I, T, S, V, B, L, A, N>
where
    I: TimeInstant,
    T: TimeSource<I>,
    S: LedStrip,
    V: InputPin,
    B: InputPin,
    L: OutputPin,
    A: Advertiser,
{
    /// Creates a controller in the `Advertising` state.
    ///
    /// `status` is driven high while a peer is connected and low otherwise.
    pub fn new(
        shared: &'a SharedState,
        clock: &'a T,
        engine: LedEngine<S, N>,
        taps: TapSensor<V, I>,
        buttons: BrightnessButtons<B, I>,
        status: L,
        advertiser: A,
    ) -> Self {
        let seen_taps = taps.events();
        Self {
            shared,
            clock,
            engine,
            taps,
            buttons,
            status,
            status_shown: None,
            advertiser,
            state: ControlState::Advertising,
            pending: None,
            seen_command: 0,
            seen_taps,
            next_tap_mode: 0,
            last_update: None,
            stats: ControllerStats::default(),
        }
    }

    /// Brings up the strip and plays the startup sweep.
    ///
    /// A strip that is not ready is logged and skipped; the control loop runs
    /// regardless and the engine checks readiness again on the first update.
    pub fn start<D: DelayNs>(&mut self, delay: &mut D) {
        if self.engine.init().is_ok() {
            self.engine.startup_sweep(delay);
        }
    }

    /// Runs the control loop forever.
    pub fn run(&mut self) -> ! {
        info!("control loop running");
        loop {
            self.step();
        }
    }

    /// Runs one loop iteration and returns the resulting state.
    pub fn step(&mut self) -> ControlState {
        self.show_link(self.shared.is_connected());

        let now = self.clock.now();
        let next = match self.state {
            ControlState::Advertising => self.advertise(),
            ControlState::Idle => self.idle(now),
            ControlState::LedControl => self.led_control(),
            ControlState::MotorConfig => self.motor_config(now),
        };

        if next != self.state {
            debug!("state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        next
    }

    /// Mirrors the link state on the status line. A failed write is retried on
    /// the next iteration.
    fn show_link(&mut self, connected: bool) {
        if self.status_shown == Some(connected) {
            return;
        }

        match self.status.set_state(PinState::from(connected)) {
            Ok(()) => self.status_shown = Some(connected),
            Err(e) => warn!("status line update failed: {:?}", Dbg(&e)),
        }
    }

    fn advertise(&mut self) -> ControlState {
        match self.advertiser.start_advertising() {
            Ok(()) => info!("advertising started"),
            Err(e) => error!("advertising failed to start: {:?}", Dbg(&e)),
        }
        ControlState::Idle
    }

    fn idle(&mut self, now: I) -> ControlState {
        if self.shared.take_motor_command() {
            self.stats.motor_commands = self.stats.motor_commands.wrapping_add(1);
            info!("motor command received");
        }

        let taps = self.taps.poll(now);
        self.buttons.poll_and_adjust(now, &mut self.engine);

        if self.shared.take_config_request() {
            info!("motor config active");
            return ControlState::MotorConfig;
        }

        if self
            .shared
            .led_command_newer_than(self.seen_command)
            .is_some()
        {
            self.pending = Some(Pending::Remote);
            return ControlState::LedControl;
        }

        if taps != self.seen_taps {
            self.seen_taps = taps;
            let command = self.next_tap_command();
            self.pending = Some(Pending::Tap(command));
            return ControlState::LedControl;
        }

        ControlState::Idle
    }

    fn led_control(&mut self) -> ControlState {
        let update = match self.pending.take() {
            Some(Pending::Tap(command)) => Some((UpdateSource::Tap, command)),
            Some(Pending::Remote) | None => {
                match self.shared.led_command_newer_than(self.seen_command) {
                    Some(staged) => {
                        self.seen_command = staged.version;
                        Some((UpdateSource::Remote, staged.value))
                    }
                    None => None,
                }
            }
        };

        match update {
            Some((source, command)) => {
                let result = self.engine.apply(&command);
                self.stats.led_updates = self.stats.led_updates.wrapping_add(1);
                if source == UpdateSource::Tap {
                    self.stats.taps_applied = self.stats.taps_applied.wrapping_add(1);
                }
                self.last_update = Some((source, result));
            }
            None => warn!("LED control entered with no command pending"),
        }

        ControlState::Idle
    }

    fn motor_config(&mut self, now: I) -> ControlState {
        if !self.shared.config_active() {
            info!("motor config finished");
            return ControlState::Idle;
        }

        self.buttons.poll_and_adjust(now, &mut self.engine);
        ControlState::MotorConfig
    }

    /// Next preset in the tap rotation, at the current global brightness.
    ///
    /// Direct-mode taps reuse the RGB of the last applied command.
    fn next_tap_command(&mut self) -> LedCommand {
        let mode = LightMode::ALL[self.next_tap_mode];
        self.next_tap_mode = (self.next_tap_mode + 1) % LightMode::ALL.len();

        let base = self
            .engine
            .last_command()
            .map_or(TAP_DEFAULT_COLOR, |last| last.color());
        let brightness = self.engine.brightness().percent();
        info!("tap selects mode {:?} at {}%", mode, brightness);

        LedCommand::new(mode.id(), base.red, base.green, base.blue, brightness)
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn engine(&self) -> &LedEngine<S, N> {
        &self.engine
    }

    /// Taps counted by the sensor so far.
    pub fn tap_events(&self) -> u32 {
        self.taps.events()
    }

    /// Source and outcome of the most recent LED update.
    pub fn last_update(&self) -> Option<(UpdateSource, Result<Rgb8, LedError>)> {
        self.last_update
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    pub fn advertiser(&self) -> &A {
        &self.advertiser
    }

    pub fn status_line(&self) -> &L {
        &self.status
    }
}
