//! LED command wire format, lighting modes and brightness.

use palette::Srgb;

/// One strip pixel, 8 bits per channel.
pub type Rgb8 = Srgb<u8>;

/// Length in bytes of an LED command on the wire.
pub const LED_COMMAND_LEN: usize = 6;

/// Units of the reserved `duration` field.
pub const DURATION_UNIT_MS: u32 = 50;

/// Fixed warm-amber preset used by [`LightMode::WarmAmber`].
pub const WARM_AMBER: Rgb8 = Srgb::new(255, 160, 64);

/// Fixed cool-blue preset used by [`LightMode::CoolBlue`].
pub const COOL_BLUE: Rgb8 = Srgb::new(0, 0, 255);

/// A command written by the remote peer to the LED control characteristic.
///
/// Wire layout, no padding:
///
/// ```text
/// mode | r | g | b | brightness (0-100) | duration (50 ms units, reserved)
/// ```
///
/// Fields are kept exactly as received. A brightness above 100 is clamped where it
/// is used, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedCommand {
    pub mode: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub brightness: u8,
    pub duration: u8,
}

impl LedCommand {
    /// Creates a command with a zero duration.
    #[inline]
    pub const fn new(mode: u8, r: u8, g: u8, b: u8, brightness: u8) -> Self {
        Self {
            mode,
            r,
            g,
            b,
            brightness,
            duration: 0,
        }
    }

    /// Parses a command from a characteristic write.
    ///
    /// # Errors
    /// * `InvalidLength` - `bytes` is not exactly [`LED_COMMAND_LEN`] long
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CommandError> {
        let raw: &[u8; LED_COMMAND_LEN] =
            bytes.try_into().map_err(|_| CommandError::InvalidLength {
                actual: bytes.len(),
            })?;

        let [mode, r, g, b, brightness, duration] = *raw;
        Ok(Self {
            mode,
            r,
            g,
            b,
            brightness,
            duration,
        })
    }

    /// Serializes the command in wire order.
    #[inline]
    pub const fn to_bytes(&self) -> [u8; LED_COMMAND_LEN] {
        [
            self.mode,
            self.r,
            self.g,
            self.b,
            self.brightness,
            self.duration,
        ]
    }

    /// Returns a copy with only the brightness field replaced.
    #[inline]
    pub const fn with_brightness(self, brightness: u8) -> Self {
        Self { brightness, ..self }
    }

    /// The command's own RGB fields.
    #[inline]
    pub const fn color(&self) -> Rgb8 {
        Srgb::new(self.r, self.g, self.b)
    }

    /// Reserved duration field converted to milliseconds.
    #[inline]
    pub const fn duration_millis(&self) -> u32 {
        self.duration as u32 * DURATION_UNIT_MS
    }
}

impl TryFrom<&[u8]> for LedCommand {
    type Error = CommandError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

/// Command decoding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Payload length differs from [`LED_COMMAND_LEN`].
    InvalidLength { actual: usize },
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommandError::InvalidLength { actual } => {
                write!(
                    f,
                    "LED command must be {} bytes, got {}",
                    LED_COMMAND_LEN, actual
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

/// Lighting modes selectable through the `mode` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LightMode {
    /// Color taken from the command's RGB fields.
    Direct = 0,
    /// Relax mode, [`WARM_AMBER`].
    WarmAmber = 1,
    /// Night mode, [`COOL_BLUE`].
    CoolBlue = 2,
}

impl LightMode {
    /// All modes in mode-id order. Taps cycle through this table.
    pub const ALL: [LightMode; 3] = [LightMode::Direct, LightMode::WarmAmber, LightMode::CoolBlue];

    /// Mode id as sent on the wire.
    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Unscaled color this mode renders for `command`.
    pub const fn source_color(self, command: &LedCommand) -> Rgb8 {
        match self {
            LightMode::Direct => command.color(),
            LightMode::WarmAmber => WARM_AMBER,
            LightMode::CoolBlue => COOL_BLUE,
        }
    }
}

impl TryFrom<u8> for LightMode {
    type Error = u8;

    /// Returns the rejected byte for unsupported modes.
    fn try_from(mode: u8) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(LightMode::Direct),
            1 => Ok(LightMode::WarmAmber),
            2 => Ok(LightMode::CoolBlue),
            other => Err(other),
        }
    }
}

/// Global brightness in percent, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Brightness(u8);

impl Brightness {
    pub const MAX: Brightness = Brightness(100);
    pub const MIN: Brightness = Brightness(0);

    /// Creates a brightness, clamping values above 100.
    #[inline]
    pub const fn new(percent: u8) -> Self {
        if percent > 100 {
            Self::MAX
        } else {
            Brightness(percent)
        }
    }

    #[inline]
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// Brightness raised by `step`, saturating at 100.
    #[inline]
    pub const fn raised(self, step: u8) -> Self {
        Self::new(self.0.saturating_add(step))
    }

    /// Brightness lowered by `step`, saturating at 0.
    #[inline]
    pub const fn lowered(self, step: u8) -> Self {
        Brightness(self.0.saturating_sub(step))
    }

    /// Scales one channel: `floor(channel * percent / 100)`.
    #[inline]
    pub const fn scale_channel(self, channel: u8) -> u8 {
        ((channel as u16 * self.0 as u16) / 100) as u8
    }

    /// Scales every channel of `color`.
    #[inline]
    pub const fn scale(self, color: Rgb8) -> Rgb8 {
        Srgb::new(
            self.scale_channel(color.red),
            self.scale_channel(color.green),
            self.scale_channel(color.blue),
        )
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<Brightness> for u8 {
    fn from(brightness: Brightness) -> Self {
        brightness.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_order() {
        let cmd = LedCommand::from_bytes(&[0, 255, 10, 20, 50, 4]).unwrap();
        assert_eq!(cmd.mode, 0);
        assert_eq!(cmd.color(), Srgb::new(255, 10, 20));
        assert_eq!(cmd.brightness, 50);
        assert_eq!(cmd.duration_millis(), 200);
        assert_eq!(cmd.to_bytes(), [0, 255, 10, 20, 50, 4]);
    }

    #[test]
    fn rejects_short_and_long_payloads() {
        assert_eq!(
            LedCommand::from_bytes(&[1, 2, 3, 4, 5]),
            Err(CommandError::InvalidLength { actual: 5 })
        );
        assert_eq!(
            LedCommand::try_from(&[0u8; 7][..]),
            Err(CommandError::InvalidLength { actual: 7 })
        );
    }

    #[test]
    fn brightness_above_range_is_kept_verbatim_in_command() {
        let cmd = LedCommand::from_bytes(&[0, 1, 2, 3, 200, 0]).unwrap();
        assert_eq!(cmd.brightness, 200);
        assert_eq!(Brightness::new(cmd.brightness), Brightness::MAX);
    }

    #[test]
    fn scaling_floors_and_never_exceeds_input() {
        for percent in 0..=100u8 {
            let b = Brightness::new(percent);
            for channel in 0..=255u8 {
                let scaled = b.scale_channel(channel);
                assert_eq!(scaled as u32, channel as u32 * percent as u32 / 100);
                assert!(scaled <= channel);
            }
        }
    }

    #[test]
    fn scaling_is_monotone_in_brightness() {
        for channel in 0..=255u8 {
            let mut previous = 0u8;
            for percent in 0..=100u8 {
                let scaled = Brightness::new(percent).scale_channel(channel);
                assert!(scaled >= previous);
                previous = scaled;
            }
        }
    }

    #[test]
    fn brightness_steps_saturate() {
        assert_eq!(Brightness::MAX.raised(10), Brightness::MAX);
        assert_eq!(Brightness::MIN.lowered(10), Brightness::MIN);
        assert_eq!(Brightness::new(50).raised(10).percent(), 60);
        assert_eq!(Brightness::new(50).lowered(10).percent(), 40);
        assert_eq!(Brightness::new(95).raised(10), Brightness::MAX);
    }

    #[test]
    fn unsupported_mode_is_returned() {
        assert_eq!(LightMode::try_from(9), Err(9));
        assert_eq!(LightMode::try_from(1), Ok(LightMode::WarmAmber));
    }

    #[test]
    fn with_brightness_changes_only_brightness() {
        let cmd = LedCommand::new(2, 9, 8, 7, 80);
        let dimmer = cmd.with_brightness(30);
        assert_eq!(dimmer.brightness, 30);
        assert_eq!(dimmer.with_brightness(80), cmd);
    }
}
