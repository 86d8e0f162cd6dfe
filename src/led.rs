//! LED actuation engine.
//!
//! Provides [`LedEngine`], which turns an [`LedCommand`] plus the global brightness
//! into one uniform color and writes it to the whole strip, and the [`LedStrip`]
//! trait for the strip hardware.

use embedded_hal::delay::DelayNs;
use palette::Srgb;
use smart_leds::{RGB8, SmartLedsWrite};

use crate::command::{Brightness, LedCommand, LightMode, Rgb8};
use crate::config::{ControllerConfig, SWEEP_STEP_MS};
use crate::logging::Dbg;

/// All channels off.
pub const PIXEL_OFF: Rgb8 = Srgb::new(0, 0, 0);

/// Colors cycled through by successive startup sweeps: red, green, blue.
pub const SWEEP_COLORS: [Rgb8; 3] = [
    Srgb::new(255, 0, 0),
    Srgb::new(0, 255, 0),
    Srgb::new(0, 0, 255),
];

/// Trait for abstracting the LED strip hardware.
///
/// Implement this for your strip driver, or wrap any `smart-leds` driver in
/// [`SmartLedsStrip`].
pub trait LedStrip {
    /// Driver error type; only logged.
    type Error: core::fmt::Debug;

    /// Whether the strip device is ready to accept frames.
    fn is_ready(&mut self) -> bool {
        true
    }

    /// Writes one complete frame, pixel 0 first.
    fn write(&mut self, pixels: &[Rgb8]) -> Result<(), Self::Error>;
}

/// Adapter from a `smart-leds` driver to [`LedStrip`].
pub struct SmartLedsStrip<W>(pub W);

impl<W> LedStrip for SmartLedsStrip<W>
where
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
{
    type Error = W::Error;

    fn write(&mut self, pixels: &[Rgb8]) -> Result<(), Self::Error> {
        self.0
            .write(pixels.iter().map(|p| RGB8::new(p.red, p.green, p.blue)))
    }
}

/// Errors reported by [`LedEngine`]. All of them are already logged when returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedError {
    /// The strip device did not report ready.
    DeviceNotReady,
    /// The command's mode byte is not a known [`LightMode`].
    UnsupportedMode(u8),
    /// The strip driver rejected the frame.
    WriteFailed,
}

impl core::fmt::Display for LedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LedError::DeviceNotReady => write!(f, "LED strip device is not ready"),
            LedError::UnsupportedMode(mode) => write!(f, "unsupported LED mode {}", mode),
            LedError::WriteFailed => write!(f, "LED strip update failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LedError {}

/// Counters kept by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineStats {
    /// Frames the strip accepted.
    pub frames_written: u32,
    /// Commands rejected for an unsupported mode.
    pub rejected_commands: u32,
    /// Frames the strip driver failed to write.
    pub write_failures: u32,
}

/// Drives a strip of `N` pixels from LED commands.
///
/// The engine owns the pixel buffer, the global brightness and the last accepted
/// command. Only the control loop holds it, so none of these need locking.
pub struct LedEngine<S: LedStrip, const N: usize> {
    strip: S,
    ready: bool,
    pixels: [Rgb8; N],
    brightness: Brightness,
    last_command: Option<LedCommand>,
    sweep_index: usize,
    sweep_step_ms: u32,
    stats: EngineStats,
}

impl<S: LedStrip, const N: usize> LedEngine<S, N> {
    /// Creates an engine that stays inert until [`init`](Self::init) succeeds.
    ///
    /// The startup sweep uses the default step of [`SWEEP_STEP_MS`].
    pub fn new(strip: S, brightness: Brightness) -> Self {
        Self {
            strip,
            ready: false,
            pixels: [PIXEL_OFF; N],
            brightness,
            last_command: None,
            sweep_index: 0,
            sweep_step_ms: SWEEP_STEP_MS,
            stats: EngineStats::default(),
        }
    }

    pub fn from_config(strip: S, config: &ControllerConfig) -> Self {
        Self {
            sweep_step_ms: config.sweep_step_ms,
            ..Self::new(strip, config.initial_brightness)
        }
    }

    /// Checks that the strip device is ready.
    ///
    /// # Errors
    /// * `DeviceNotReady` - the engine stays inert; `apply` checks readiness again later
    pub fn init(&mut self) -> Result<(), LedError> {
        self.ready = self.strip.is_ready();
        if self.ready {
            info!("LED strip ready, {} pixels", N);
            Ok(())
        } else {
            error!("LED strip device is not ready");
            Err(LedError::DeviceNotReady)
        }
    }

    /// Renders `command` on every pixel.
    ///
    /// Accepted commands (known mode) are cached verbatim as the last command and
    /// set the global brightness from their brightness field. The color is scaled
    /// by that global brightness and written with a single strip update.
    ///
    /// # Returns
    /// * `Ok(color)` - the color now on every pixel
    /// * `Err(UnsupportedMode)` - nothing changed, previous frame retained
    /// * `Err(WriteFailed)` - the write was abandoned; no retry
    /// * `Err(DeviceNotReady)` - strip still not ready
    pub fn apply(&mut self, command: &LedCommand) -> Result<Rgb8, LedError> {
        if !self.ready && self.init().is_err() {
            return Err(LedError::DeviceNotReady);
        }

        let mode = match LightMode::try_from(command.mode) {
            Ok(mode) => mode,
            Err(mode) => {
                warn!("unsupported LED mode {}", mode);
                self.stats.rejected_commands = self.stats.rejected_commands.wrapping_add(1);
                return Err(LedError::UnsupportedMode(mode));
            }
        };

        self.last_command = Some(*command);
        self.brightness = Brightness::new(command.brightness);

        info!(
            "LED mode {:?} rgb ({}, {}, {}) brightness {} duration {}",
            mode,
            command.r,
            command.g,
            command.b,
            command.brightness,
            command.duration
        );

        let color = self.brightness.scale(mode.source_color(command));
        self.pixels.fill(color);
        self.flush()?;
        Ok(color)
    }

    /// Plays one pass of the startup animation.
    ///
    /// Lights one pixel at a time with the next color of [`SWEEP_COLORS`], waiting
    /// the configured sweep step after each one. Brightness and the last command
    /// are untouched.
    pub fn startup_sweep<D: DelayNs>(&mut self, delay: &mut D) {
        let color = SWEEP_COLORS[self.sweep_index];

        for cursor in 0..N {
            self.pixels.fill(PIXEL_OFF);
            self.pixels[cursor] = color;

            if let Err(e) = self.strip.write(&self.pixels) {
                error!("couldn't update strip: {:?}", Dbg(&e));
                self.stats.write_failures = self.stats.write_failures.wrapping_add(1);
            } else {
                self.stats.frames_written = self.stats.frames_written.wrapping_add(1);
            }

            delay.delay_ms(self.sweep_step_ms);
        }

        self.sweep_index = (self.sweep_index + 1) % SWEEP_COLORS.len();
    }

    fn flush(&mut self) -> Result<(), LedError> {
        match self.strip.write(&self.pixels) {
            Ok(()) => {
                self.stats.frames_written = self.stats.frames_written.wrapping_add(1);
                Ok(())
            }
            Err(e) => {
                error!("LED update failed: {:?}", Dbg(&e));
                self.stats.write_failures = self.stats.write_failures.wrapping_add(1);
                Err(LedError::WriteFailed)
            }
        }
    }

    /// The most recently accepted command, if any.
    pub fn last_command(&self) -> Option<LedCommand> {
        self.last_command
    }

    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    /// Sets the global brightness without rendering.
    pub fn set_brightness(&mut self, brightness: Brightness) {
        self.brightness = brightness;
    }

    /// Current contents of the pixel buffer.
    pub fn pixels(&self) -> &[Rgb8; N] {
        &self.pixels
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn strip(&self) -> &S {
        &self.strip
    }

    pub fn strip_mut(&mut self) -> &mut S {
        &mut self.strip
    }
}
