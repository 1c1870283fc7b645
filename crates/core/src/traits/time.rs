//! Time abstraction traits for platform-agnostic timing operations.
//!
//! The turn controller never reads a wall clock or sleeps directly. It is
//! handed a `TimeSource` for timestamps and an `embedded_hal::delay::DelayNs`
//! for blocking pauses, usually the same object. On hardware that is the HAL
//! timer; on host it is [`MockTime`] or a simulator clock, where a delay
//! simply advances simulated time.

use core::cell::Cell;

use embedded_hal::delay::DelayNs;

/// Platform-agnostic time source for control loops and timing.
///
/// # Example
///
/// ```
/// use gyro_turn_core::traits::{MockTime, TimeSource};
///
/// fn due<T: TimeSource>(time: &T, last_update: u64) -> bool {
///     time.elapsed_since(last_update) >= 10_000 // 100Hz
/// }
///
/// let time = MockTime::new();
/// assert!(!due(&time, 0));
/// time.advance(10_000);
/// assert!(due(&time, 0));
/// ```
pub trait TimeSource {
    /// Returns current time in microseconds since system start.
    fn now_us(&self) -> u64;

    /// Returns current time in milliseconds since system start.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    /// Returns elapsed time in microseconds since a reference point.
    ///
    /// Uses saturating subtraction to handle potential overflow.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }
}

/// Clock plus blocking pause, the pair every cooperative control loop needs.
///
/// Blanket-implemented for anything that is both a [`TimeSource`] and a
/// [`DelayNs`].
pub trait Timer: TimeSource + DelayNs {}

impl<T: TimeSource + DelayNs> Timer for T {}

impl<T: TimeSource> TimeSource for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock time source for testing with controllable time advancement.
///
/// Delays advance the mock clock instantly, so a blocking turn runs in
/// simulated time without sleeping.
///
/// # Example
///
/// ```
/// use embedded_hal::delay::DelayNs;
/// use gyro_turn_core::traits::{MockTime, TimeSource};
///
/// let mut time = MockTime::new();
/// assert_eq!(time.now_us(), 0);
///
/// time.advance(1000); // Advance 1ms
/// assert_eq!(time.now_ms(), 1);
///
/// time.delay_ms(10);
/// assert_eq!(time.now_ms(), 11);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTime {
    current_us: Cell<u64>,
}

impl MockTime {
    /// Creates a new `MockTime` starting at time 0.
    pub fn new() -> Self {
        Self {
            current_us: Cell::new(0),
        }
    }

    /// Creates a new `MockTime` starting at the specified time.
    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Cell::new(us),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set(&self, us: u64) {
        self.current_us.set(us);
    }

    /// Advances the current time by the specified amount, saturating at `u64::MAX`.
    pub fn advance(&self, us: u64) {
        self.current_us.set(self.current_us.get().saturating_add(us));
    }
}

impl TimeSource for MockTime {
    fn now_us(&self) -> u64 {
        self.current_us.get()
    }
}

impl DelayNs for MockTime {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns) / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms) * 1000);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_time_initial_value() {
        let time = MockTime::new();
        assert_eq!(time.now_us(), 0);
        assert_eq!(time.now_ms(), 0);
    }

    #[test]
    fn mock_time_with_initial() {
        let time = MockTime::with_initial(5_000_000);
        assert_eq!(time.now_us(), 5_000_000);
        assert_eq!(time.now_ms(), 5000);
    }

    #[test]
    fn mock_time_set_and_advance() {
        let time = MockTime::new();
        time.set(1_000_000);
        time.advance(500_000);
        assert_eq!(time.now_us(), 1_500_000);
        assert_eq!(time.now_ms(), 1500);
    }

    #[test]
    fn mock_time_elapsed_since_saturates() {
        let time = MockTime::new();
        time.set(1_000);

        // Reference is in the "future" - should saturate to 0
        assert_eq!(time.elapsed_since(5_000), 0);
        assert_eq!(time.elapsed_since(400), 600);
    }

    #[test]
    fn mock_time_advance_saturates() {
        let time = MockTime::with_initial(u64::MAX - 10);
        time.advance(100);
        assert_eq!(time.now_us(), u64::MAX);
    }

    #[test]
    fn delay_advances_clock() {
        let mut time = MockTime::new();
        time.delay_ms(50);
        assert_eq!(time.now_us(), 50_000);

        time.delay_us(250);
        assert_eq!(time.now_us(), 50_250);

        // Sub-microsecond remainders are dropped
        time.delay_ns(1_999);
        assert_eq!(time.now_us(), 50_251);
    }

    #[test]
    fn reference_forwards_to_source() {
        let time = MockTime::with_initial(42);
        let by_ref = &time;
        assert_eq!(TimeSource::now_us(&by_ref), 42);
    }
}
