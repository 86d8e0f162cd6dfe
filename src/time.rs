//! Time abstraction traits for platform-agnostic debouncing.
//!
//! The debouncers never sleep. They compare instants handed to them by the control
//! loop, so the whole input path runs against virtual time in tests and against
//! the platform's monotonic clock on hardware.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;

    /// Whole milliseconds elapsed since `earlier`.
    #[inline]
    fn millis_since(&self, earlier: Self) -> u64 {
        self.duration_since(earlier).as_millis()
    }
}

impl TimeDuration for core::time::Duration {
    #[inline]
    fn as_millis(&self) -> u64 {
        core::time::Duration::as_millis(self) as u64
    }
}

#[cfg(feature = "std")]
impl TimeInstant for std::time::Instant {
    type Duration = core::time::Duration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        self.saturating_duration_since(earlier)
    }
}

/// Monotonic clock backed by `std::time::Instant`, for host-side simulation.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct StdClock;

#[cfg(feature = "std")]
impl TimeSource<std::time::Instant> for StdClock {
    fn now(&self) -> std::time::Instant {
        std::time::Instant::now()
    }
}
