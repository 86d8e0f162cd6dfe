//! State shared between the BLE callback context and the control loop.
//!
//! The BLE stack calls into [`crate::gatt::CommandIngest`] from its own context at
//! arbitrary points of the control loop. Everything that crosses that boundary
//! lives here and is only touched inside a critical section, so the loop never
//! observes a half-written command.
//!
//! Ownership of each field is single-writer:
//! - the LED mailbox and the `motor_received`/`config_requested` flags are written
//!   by the producer and cleared by the consumer's `take_*` calls;
//! - `config_active` is toggled by configuration writes and cleared on disconnect;
//! - `connected` follows the link state reported by the BLE stack.

use core::cell::Cell;

use critical_section::Mutex;

use crate::command::LedCommand;

/// A value tagged with the mailbox version it was posted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Versioned<T> {
    pub version: u32,
    pub value: T,
}

#[derive(Clone, Copy)]
struct Slot<T: Copy> {
    version: u32,
    value: Option<T>,
}

/// Single-slot, version-tagged handoff between one producer and one consumer.
///
/// A post overwrites any value the consumer has not picked up yet, so the consumer
/// always sees the most recent one. The consumer remembers the last version it
/// handled and asks only for newer ones.
pub struct Mailbox<T: Copy> {
    slot: Mutex<Cell<Slot<T>>>,
}

impl<T: Copy> Mailbox<T> {
    /// Creates an empty mailbox at version 0.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                version: 0,
                value: None,
            })),
        }
    }

    /// Stores `value` and returns its version.
    pub fn post(&self, value: T) -> u32 {
        critical_section::with(|cs| {
            let cell = self.slot.borrow(cs);
            let mut slot = cell.get();
            slot.version = slot.version.wrapping_add(1);
            slot.value = Some(value);
            cell.set(slot);
            slot.version
        })
    }

    /// Returns the stored value if it was posted after version `seen`.
    pub fn newer_than(&self, seen: u32) -> Option<Versioned<T>> {
        let slot = critical_section::with(|cs| self.slot.borrow(cs).get());
        match slot.value {
            Some(value) if slot.version != seen => Some(Versioned {
                version: slot.version,
                value,
            }),
            _ => None,
        }
    }

    /// Version of the most recent post (0 before the first one).
    pub fn version(&self) -> u32 {
        critical_section::with(|cs| self.slot.borrow(cs).get().version)
    }
}

impl<T: Copy> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
struct Flags {
    motor_received: bool,
    config_requested: bool,
    config_active: bool,
    connected: bool,
}

/// Immutable copy of the shared flags, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlagSnapshot {
    pub motor_received: bool,
    pub config_requested: bool,
    pub config_active: bool,
    pub connected: bool,
}

/// Everything the BLE context hands to the control loop.
///
/// `const`-constructible, so it normally lives in a `static`:
///
/// ```
/// use tap_light::SharedState;
///
/// static SHARED: SharedState = SharedState::new();
/// ```
pub struct SharedState {
    led: Mailbox<LedCommand>,
    flags: Mutex<Cell<Flags>>,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            led: Mailbox::new(),
            flags: Mutex::new(Cell::new(Flags {
                motor_received: false,
                config_requested: false,
                config_active: false,
                connected: false,
            })),
        }
    }

    fn update_flags<R>(&self, f: impl FnOnce(&mut Flags) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.flags.borrow(cs);
            let mut flags = cell.get();
            let result = f(&mut flags);
            cell.set(flags);
            result
        })
    }

    // ---- producer side (BLE context) ---------------------------------------

    /// Stages an LED command; returns its mailbox version.
    pub fn post_led_command(&self, command: LedCommand) -> u32 {
        self.led.post(command)
    }

    /// Records that the motor characteristic was written.
    pub fn flag_motor_command(&self) {
        self.update_flags(|flags| flags.motor_received = true);
    }

    /// Flips the configuration session and returns whether it is now active.
    ///
    /// Starting a session also requests the configuration state; ending one
    /// withdraws a request the control loop has not picked up yet.
    pub fn toggle_config(&self) -> bool {
        self.update_flags(|flags| {
            let active = !flags.config_active;
            flags.config_requested = active;
            flags.config_active = active;
            active
        })
    }

    /// Records the link state; cleared links also end configuration.
    pub fn set_connected(&self, connected: bool) {
        self.update_flags(|flags| {
            flags.connected = connected;
            if !connected {
                flags.config_requested = false;
                flags.config_active = false;
            }
        });
    }

    // ---- consumer side (control loop) --------------------------------------

    /// Newest staged LED command posted after version `seen`.
    pub fn led_command_newer_than(&self, seen: u32) -> Option<Versioned<LedCommand>> {
        self.led.newer_than(seen)
    }

    /// Reads and clears the motor flag.
    pub fn take_motor_command(&self) -> bool {
        self.update_flags(|flags| core::mem::take(&mut flags.motor_received))
    }

    /// Reads and clears a pending configuration request.
    pub fn take_config_request(&self) -> bool {
        self.update_flags(|flags| core::mem::take(&mut flags.config_requested))
    }

    pub fn config_active(&self) -> bool {
        self.snapshot().config_active
    }

    pub fn is_connected(&self) -> bool {
        self.snapshot().connected
    }

    pub fn snapshot(&self) -> FlagSnapshot {
        let flags = critical_section::with(|cs| self.flags.borrow(cs).get());
        FlagSnapshot {
            motor_received: flags.motor_received,
            config_requested: flags.config_requested,
            config_active: flags.config_active,
            connected: flags.connected,
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mailbox_has_nothing_newer() {
        let mailbox: Mailbox<u8> = Mailbox::new();
        assert_eq!(mailbox.newer_than(0), None);
        assert_eq!(mailbox.version(), 0);
    }

    #[test]
    fn most_recent_post_wins() {
        let mailbox = Mailbox::new();
        mailbox.post(1u8);
        let v2 = mailbox.post(2u8);

        let got = mailbox.newer_than(0).unwrap();
        assert_eq!(got.value, 2);
        assert_eq!(got.version, v2);
        assert_eq!(mailbox.newer_than(v2), None);
    }

    #[test]
    fn take_flags_clear_them() {
        let shared = SharedState::new();
        assert!(!shared.take_motor_command());

        shared.flag_motor_command();
        assert!(shared.take_motor_command());
        assert!(!shared.take_motor_command());
    }

    #[test]
    fn config_request_is_consumed_but_active_flag_persists() {
        let shared = SharedState::new();
        assert!(shared.toggle_config());

        assert!(shared.take_config_request());
        assert!(!shared.take_config_request());
        assert!(shared.config_active());

        shared.set_connected(false);
        assert!(!shared.config_active());
        assert_eq!(shared.snapshot(), FlagSnapshot::default());
    }

    #[test]
    fn second_toggle_ends_session_and_withdraws_request() {
        let shared = SharedState::new();

        assert!(shared.toggle_config());
        assert!(!shared.toggle_config());

        assert!(!shared.config_active());
        assert!(!shared.take_config_request());
    }

    #[test]
    fn losing_the_link_ends_configuration() {
        let shared = SharedState::new();
        shared.set_connected(true);
        shared.toggle_config();

        shared.set_connected(false);

        assert!(!shared.is_connected());
        assert!(!shared.config_active());
        assert_eq!(shared.snapshot(), FlagSnapshot::default());
    }
}
