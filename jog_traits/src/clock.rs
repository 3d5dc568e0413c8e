use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock abstraction for pulse timing and tick pacing.
///
/// - now(): returns a monotonic Instant
/// - sleep(): yields the thread for the provided duration (implementations may simulate)
/// - busy_wait(): holds the CPU for the provided duration; used for step pulse timing
/// - ms_since(): helper to compute elapsed milliseconds from an epoch Instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);
    fn busy_wait(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis() as u64
    }

    /// Microsecond convenience wrapper over `busy_wait`.
    fn delay_us(&self, us: u64) {
        self.busy_wait(Duration::from_micros(us));
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }

    fn busy_wait(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        let deadline = Instant::now() + d;
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// Deterministic clock whose time only moves when told to.
///
/// now() = origin + offset
/// sleep(d) and busy_wait(d) advance internal time by d without waiting.
/// Clones share the same timeline, so a test can keep one handle while the
/// controller owns another.
#[derive(Debug, Clone)]
pub struct TestClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    /// Set the absolute offset relative to origin.
    pub fn set_offset(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = d;
        }
    }

    /// Total simulated time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }

    fn busy_wait(&self, d: Duration) {
        self.advance(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_clones_share_time() {
        let a = TestClock::new();
        let b = a.clone();
        let start = a.now();
        b.busy_wait(Duration::from_micros(1500));
        a.sleep(Duration::from_millis(2));
        assert_eq!(a.now() - start, Duration::from_micros(3500));
        assert_eq!(b.ms_since(start), 3);
    }

    #[test]
    fn monotonic_busy_wait_holds_at_least_requested() {
        let clock = MonotonicClock::new();
        let t0 = Instant::now();
        clock.delay_us(200);
        assert!(t0.elapsed() >= Duration::from_micros(200));
    }
}
