//! Shared test infrastructure for tap-light integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use tap_light::{Advertiser, LedStrip, Rgb8, TimeDuration, TimeInstant, TimeSource};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }

    pub fn set_time(&self, time: TestInstant) {
        self.current_time.set(time);
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Strip
// ============================================================================

/// Mock strip that records every frame it accepts
pub struct MockStrip {
    last_frame: heapless::Vec<Rgb8, 16>,
    writes: u32,
    ready_checks: u32,
    pub fail_writes: bool,
    pub ready: bool,
}

impl MockStrip {
    pub fn new() -> Self {
        Self {
            last_frame: heapless::Vec::new(),
            writes: 0,
            ready_checks: 0,
            fail_writes: false,
            ready: true,
        }
    }

    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    pub fn last_frame(&self) -> &[Rgb8] {
        &self.last_frame
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Number of times the driver was asked whether it is ready
    pub fn ready_checks(&self) -> u32 {
        self.ready_checks
    }
}

impl LedStrip for MockStrip {
    type Error = &'static str;

    fn is_ready(&mut self) -> bool {
        self.ready_checks += 1;
        self.ready
    }

    fn write(&mut self, pixels: &[Rgb8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err("bus error");
        }
        self.last_frame.clear();
        for pixel in pixels {
            let _ = self.last_frame.push(*pixel);
        }
        self.writes += 1;
        Ok(())
    }
}

// ============================================================================
// Mock Pins
// ============================================================================

/// Input pin whose level is driven from the test through a shared cell
pub struct MockPin<'a> {
    high: &'a Cell<bool>,
}

impl<'a> MockPin<'a> {
    pub fn new(high: &'a Cell<bool>) -> Self {
        Self { high }
    }
}

impl ErrorType for MockPin<'_> {
    type Error = Infallible;
}

impl InputPin for MockPin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high.get())
    }
}

/// Output pin that records its level and how often it was driven
pub struct MockStatusLed {
    pub lit: bool,
    pub writes: u32,
}

impl MockStatusLed {
    pub fn new() -> Self {
        Self {
            lit: false,
            writes: 0,
        }
    }
}

impl ErrorType for MockStatusLed {
    type Error = Infallible;
}

impl OutputPin for MockStatusLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.lit = false;
        self.writes += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.lit = true;
        self.writes += 1;
        Ok(())
    }
}

// ============================================================================
// Mock Advertiser and Delay
// ============================================================================

/// Advertiser that counts start requests and can be told to fail
pub struct MockAdvertiser {
    pub starts: u32,
    pub fail: bool,
}

impl MockAdvertiser {
    pub fn new() -> Self {
        Self {
            starts: 0,
            fail: false,
        }
    }
}

impl Advertiser for MockAdvertiser {
    type Error = &'static str;

    fn start_advertising(&mut self) -> Result<(), Self::Error> {
        self.starts += 1;
        if self.fail {
            return Err("advertising rejected");
        }
        Ok(())
    }
}

/// Delay that only records how long it was asked to wait
pub struct MockDelay {
    pub total_ns: u64,
    pub calls: u32,
}

impl MockDelay {
    pub fn new() -> Self {
        Self {
            total_ns: 0,
            calls: 0,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }
}
