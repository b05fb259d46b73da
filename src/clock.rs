//! Injectable time source for scoring and expiry.
//!
//! Relevance decay and TTL expiry are pure functions of "now". Threading a
//! [`Clock`] through the buffer instead of calling the system clock inline
//! keeps both deterministic under test: a [`ManualClock`] can be advanced
//! explicitly with no sleeps.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current time, in unix milliseconds.
///
/// All age, decay, and expiry computations in the crate read time through
/// this trait. Production code uses [`SystemClock`]; tests use
/// [`ManualClock`].
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current unix timestamp in milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall-clock time source backed by [`std::time::SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    fn now_ms(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Interior mutability lets a test hold an `Arc<ManualClock>` clone while the
/// buffer reads the same instant through its `Arc<dyn Clock>`.
///
/// # Examples
///
/// ```
/// use cwm_rs::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000);
/// clock.advance_secs(601);
/// assert_eq!(clock.now_ms(), 602_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Creates a manual clock starting at the given unix millisecond instant.
    #[must_use]
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    /// Creates a manual clock wrapped in an [`Arc`] for sharing with a buffer.
    #[must_use]
    pub fn shared(start_ms: i64) -> Arc<Self> {
        Arc::new(Self::new(start_ms))
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Advances the clock by the given number of seconds.
    pub fn advance_secs(&self, delta_secs: i64) {
        self.advance_ms(delta_secs * 1000);
    }

    /// Sets the clock to an absolute unix millisecond instant.
    pub fn set_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(a > 0);
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(500);
        assert_eq!(clock.now_ms(), 500);

        clock.advance_ms(250);
        assert_eq!(clock.now_ms(), 750);

        clock.advance_secs(2);
        assert_eq!(clock.now_ms(), 2750);
    }

    #[test]
    fn test_manual_clock_set() {
        let clock = ManualClock::new(0);
        clock.set_ms(1_700_000_000_000);
        assert_eq!(clock.now_ms(), 1_700_000_000_000);
    }

    #[test]
    fn test_shared_manual_clock() {
        let clock = ManualClock::shared(100);
        let view: Arc<ManualClock> = Arc::clone(&clock);
        clock.advance_ms(50);
        assert_eq!(view.now_ms(), 150);
    }
}
