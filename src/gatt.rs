//! Command ingestion for the control service's characteristics.
//!
//! ## GATT Service Layout
//!
//! | Characteristic  | UUID                                   | Perms              |
//! |-----------------|----------------------------------------|--------------------|
//! | Control service | `534c4220-4441-4e54-494e-4f0000001000` |                    |
//! | LED control     | `534c4220-4441-4e54-494e-4f0000001001` | Read/Write/Notify  |
//! | Motor           | `534c4220-4441-4e54-494e-4f0000001002` | Read/Write/Notify  |
//! | Motor config    | `534c4220-4441-4e54-494e-4f0000001003` | Read/Write/Notify  |
//!
//! The BLE stack registers the service and forwards writes, reads and link events
//! to [`CommandIngest`]. Everything here runs in the BLE callback context and only
//! touches [`SharedState`].

use crate::command::{LED_COMMAND_LEN, LedCommand};
use crate::shared::SharedState;

pub const SERVICE_UUID: u128 = 0x534c4220_4441_4e54_494e_4f0000001000;
pub const CHAR_LED_CONTROL: u128 = 0x534c4220_4441_4e54_494e_4f0000001001;
pub const CHAR_MOTOR: u128 = 0x534c4220_4441_4e54_494e_4f0000001002;
pub const CHAR_MOTOR_CONFIG: u128 = 0x534c4220_4441_4e54_494e_4f0000001003;

/// Characteristics of the control service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Characteristic {
    LedControl,
    Motor,
    MotorConfig,
}

impl Characteristic {
    pub const ALL: [Characteristic; 3] = [
        Characteristic::LedControl,
        Characteristic::Motor,
        Characteristic::MotorConfig,
    ];

    pub const fn uuid(self) -> u128 {
        match self {
            Characteristic::LedControl => CHAR_LED_CONTROL,
            Characteristic::Motor => CHAR_MOTOR,
            Characteristic::MotorConfig => CHAR_MOTOR_CONFIG,
        }
    }

    pub const fn from_uuid(uuid: u128) -> Option<Self> {
        match uuid {
            CHAR_LED_CONTROL => Some(Characteristic::LedControl),
            CHAR_MOTOR => Some(Characteristic::Motor),
            CHAR_MOTOR_CONFIG => Some(Characteristic::MotorConfig),
            _ => None,
        }
    }

    /// Fixed acknowledgement returned on reads. Not live state.
    pub const fn read_response(self) -> &'static [u8] {
        match self {
            Characteristic::LedControl => b"LED control OK",
            Characteristic::Motor => b"Motor OK",
            Characteristic::MotorConfig => b"Motor config OK",
        }
    }
}

/// What a successful write staged for the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Staged {
    /// LED command posted to the mailbox under `version`.
    LedCommand { version: u32 },
    /// Motor flag raised.
    MotorFlag,
    /// Configuration requested and marked active.
    ConfigActivated,
    /// Active configuration ended by a second write.
    ConfigDeactivated,
}

/// Reasons a write was not staged. The write is acknowledged either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IngestError {
    /// LED control write with a length other than [`LED_COMMAND_LEN`].
    MalformedLength { expected: usize, actual: usize },
    /// Write to a characteristic outside the control service.
    UnknownCharacteristic,
}

impl core::fmt::Display for IngestError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IngestError::MalformedLength { expected, actual } => {
                write!(
                    f,
                    "malformed LED command: expected {} bytes, got {}",
                    expected, actual
                )
            }
            IngestError::UnknownCharacteristic => write!(f, "unknown characteristic"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IngestError {}

/// BLE-side entry point. Cheap to copy; hand one to each callback.
#[derive(Clone, Copy)]
pub struct CommandIngest<'a> {
    shared: &'a SharedState,
}

impl<'a> CommandIngest<'a> {
    pub fn new(shared: &'a SharedState) -> Self {
        Self { shared }
    }

    /// Classifies a write and stages its effect.
    pub fn ingest(&self, uuid: u128, bytes: &[u8]) -> Result<Staged, IngestError> {
        match Characteristic::from_uuid(uuid) {
            Some(Characteristic::LedControl) => {
                let command =
                    LedCommand::from_bytes(bytes).map_err(|_| IngestError::MalformedLength {
                        expected: LED_COMMAND_LEN,
                        actual: bytes.len(),
                    })?;
                let version = self.shared.post_led_command(command);
                Ok(Staged::LedCommand { version })
            }
            Some(Characteristic::Motor) => {
                self.shared.flag_motor_command();
                Ok(Staged::MotorFlag)
            }
            Some(Characteristic::MotorConfig) => {
                if self.shared.toggle_config() {
                    Ok(Staged::ConfigActivated)
                } else {
                    Ok(Staged::ConfigDeactivated)
                }
            }
            None => Err(IngestError::UnknownCharacteristic),
        }
    }

    /// Write hook for the BLE stack. Returns the number of bytes acknowledged,
    /// which is always the full write.
    pub fn on_write(&self, uuid: u128, bytes: &[u8]) -> usize {
        match self.ingest(uuid, bytes) {
            Ok(staged) => debug!("write staged: {:?}", staged),
            Err(e) => debug!("write ignored: {:?}", e),
        }
        bytes.len()
    }

    /// Read hook for the BLE stack. Unknown characteristics read as empty.
    pub fn on_read(&self, uuid: u128) -> &'static [u8] {
        Characteristic::from_uuid(uuid)
            .map(Characteristic::read_response)
            .unwrap_or(&[])
    }

    /// Connect hook. Lights the connection status line on the next loop iteration.
    pub fn on_connect(&self) {
        info!("peer connected");
        self.shared.set_connected(true);
    }

    /// Disconnect hook. Clears the connection status and ends any active
    /// configuration session.
    pub fn on_disconnect(&self) {
        info!("peer disconnected");
        self.shared.set_connected(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_round_trip() {
        for characteristic in Characteristic::ALL {
            assert_eq!(
                Characteristic::from_uuid(characteristic.uuid()),
                Some(characteristic)
            );
        }
        assert_eq!(Characteristic::from_uuid(SERVICE_UUID), None);
    }

    #[test]
    fn malformed_and_unknown_writes_are_distinct_errors() {
        let shared = SharedState::new();
        let ingest = CommandIngest::new(&shared);

        assert_eq!(
            ingest.ingest(CHAR_LED_CONTROL, &[0, 1, 2]),
            Err(IngestError::MalformedLength {
                expected: 6,
                actual: 3
            })
        );
        assert_eq!(
            ingest.ingest(0x1234, &[0; 6]),
            Err(IngestError::UnknownCharacteristic)
        );
        assert_eq!(shared.led_command_newer_than(0), None);
    }

    #[test]
    fn every_write_is_acknowledged_in_full() {
        let shared = SharedState::new();
        let ingest = CommandIngest::new(&shared);

        assert_eq!(ingest.on_write(CHAR_LED_CONTROL, &[1, 2]), 2);
        assert_eq!(ingest.on_write(0xdead, &[1, 2, 3]), 3);
        assert_eq!(ingest.on_write(CHAR_MOTOR, &[]), 0);
    }

    #[test]
    fn config_writes_toggle_the_session() {
        let shared = SharedState::new();
        let ingest = CommandIngest::new(&shared);

        assert_eq!(ingest.ingest(CHAR_MOTOR_CONFIG, &[1]), Ok(Staged::ConfigActivated));
        assert_eq!(ingest.ingest(CHAR_MOTOR_CONFIG, &[1]), Ok(Staged::ConfigDeactivated));
        assert!(!shared.config_active());
        assert_eq!(ingest.ingest(CHAR_MOTOR_CONFIG, &[]), Ok(Staged::ConfigActivated));
    }

    #[test]
    fn connect_and_disconnect_track_link_state() {
        let shared = SharedState::new();
        let ingest = CommandIngest::new(&shared);

        ingest.on_connect();
        assert!(shared.is_connected());
        ingest.on_disconnect();
        assert!(!shared.is_connected());
    }
}
