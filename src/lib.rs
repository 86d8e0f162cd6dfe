#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`LedCommand`**: The 6-byte command written to the LED control characteristic
//! - **`LedEngine`**: Resolves a command and the global brightness into one color for the whole strip
//! - **`LedStrip`**: Trait to implement for your strip driver (or wrap a `smart-leds` driver)
//! - **`TapSensor`**: Debounced tap counter on a polled vibration line
//! - **`BrightnessButtons`**: Increase/decrease buttons stepping the global brightness
//! - **`SharedState`**: Mailbox and flags handed from the BLE context to the control loop
//! - **`CommandIngest`**: Write/read/connect/disconnect hooks for the BLE stack
//! - **`Controller`**: The control FSM that ties everything together
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! Pixels are `Srgb<u8>`; scaling is integer-only, `floor(channel * percent / 100)`.

#[macro_use]
mod logging;

pub mod buttons;
pub mod command;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod gatt;
pub mod led;
pub mod shared;
pub mod time;
pub mod vibration;

pub use buttons::{Adjustment, BrightnessButtons, ButtonAction, ButtonPresses, adjust};
pub use command::{Brightness, CommandError, LED_COMMAND_LEN, LedCommand, LightMode, Rgb8};
pub use config::ControllerConfig;
pub use controller::{Advertiser, ControlState, Controller, ControllerStats, UpdateSource};
pub use debounce::{ActiveLevel, DebounceConfig, DebouncePhase, Debouncer};
pub use gatt::{Characteristic, CommandIngest, IngestError, Staged};
pub use led::{EngineStats, LedEngine, LedError, LedStrip, SmartLedsStrip};
pub use shared::{Mailbox, SharedState, Versioned};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use vibration::TapSensor;

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;
