//! Blocking step/dir pulse generator with a shared, active-low enable line.
//!
//! A move owns the processor for its entire duration: every delay is a
//! busy-wait on the injected `Clock`. The watchdog is refreshed from inside
//! the pulse loop so long moves do not trip a supervisory reset.

use std::sync::Arc;

use jog_traits::clock::Clock;
use jog_traits::{Level, PinBank, Watchdog};

use crate::config::{AxisPins, PulseTiming};
use crate::error::{JogError, MoveFault};
use crate::hw_error::map_boxed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }

    /// +1 for forward, -1 for backward.
    #[inline]
    pub fn sign(self) -> i32 {
        if self.is_forward() { 1 } else { -1 }
    }

    /// Direction that reduces a positive/negative error. Zero maps to backward.
    #[inline]
    pub fn toward(error: i32) -> Self {
        if error > 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

pub struct StepActuator<P, W> {
    pins: P,
    watchdog: W,
    clock: Arc<dyn Clock + Send + Sync>,
    enable_pin: u8,
    enabled: bool,
    // Lifetime count of pulses that reached the drivers
    total_steps: u64,
}

impl<P, W> core::fmt::Debug for StepActuator<P, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StepActuator")
            .field("enable_pin", &self.enable_pin)
            .field("enabled", &self.enabled)
            .field("total_steps", &self.total_steps)
            .finish()
    }
}

impl<P: PinBank, W: Watchdog> StepActuator<P, W> {
    pub fn new(pins: P, watchdog: W, clock: Arc<dyn Clock + Send + Sync>, enable_pin: u8) -> Self {
        Self {
            pins,
            watchdog,
            clock,
            enable_pin,
            enabled: false,
            total_steps: 0,
        }
    }

    /// Last level successfully written to the enable line.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    pub fn refresh_watchdog(&mut self) {
        self.watchdog.refresh();
    }

    /// Drive the shared enable line low (drivers energized).
    pub fn enable(&mut self) -> Result<(), JogError> {
        self.write(self.enable_pin, Level::Low)?;
        self.enabled = true;
        Ok(())
    }

    /// Drive the shared enable line high (drivers released).
    pub fn disable(&mut self) -> Result<(), JogError> {
        self.write(self.enable_pin, Level::High)?;
        self.enabled = false;
        Ok(())
    }

    /// Issue up to `min(steps, ceiling)` pulses on `axis` and return how many
    /// were issued.
    ///
    /// Asserts the enable line, sets direction, waits the settle time, then
    /// for each pulse holds the step line high for `pulse_high_us` and low for
    /// `pulse_low_us`. The watchdog is refreshed on every pulse index that is a
    /// multiple of `watchdog_every`.
    pub fn move_axis(
        &mut self,
        axis: AxisPins,
        direction: Direction,
        steps: u32,
        ceiling: u32,
        timing: &PulseTiming,
    ) -> Result<u32, MoveFault> {
        let requested = steps.min(ceiling);
        let fault = |issued: u32, error: JogError| MoveFault {
            issued,
            requested,
            error,
        };

        self.enable().map_err(|e| fault(0, e))?;
        self.write(axis.dir, Level::from_high(direction.is_forward()))
            .map_err(|e| fault(0, e))?;
        self.clock.delay_us(u64::from(timing.dir_settle_us));

        let every = timing.watchdog_every.max(1);
        for i in 0..requested {
            self.write(axis.step, Level::High).map_err(|e| fault(i, e))?;
            // The driver latches the step on the rising edge.
            self.total_steps += 1;
            self.clock.delay_us(u64::from(timing.pulse_high_us));
            self.write(axis.step, Level::Low)
                .map_err(|e| fault(i + 1, e))?;
            self.clock.delay_us(u64::from(timing.pulse_low_us));

            if i % every == 0 {
                self.watchdog.refresh();
            }
        }
        tracing::trace!(
            step_pin = axis.step,
            dir_pin = axis.dir,
            forward = direction.is_forward(),
            steps = requested,
            "move done"
        );
        Ok(requested)
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), JogError> {
        self.pins.write(pin, level).map_err(map_boxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{CountingWatchdog, RecordingPins};
    use jog_traits::TestClock;
    use std::time::Duration;

    const X: AxisPins = AxisPins { step: 17, dir: 27 };

    fn timing() -> PulseTiming {
        PulseTiming {
            dir_settle_us: 10,
            pulse_high_us: 500,
            pulse_low_us: 1500,
            watchdog_every: 10,
        }
    }

    #[test]
    fn pulses_count_and_polarity() {
        let pins = RecordingPins::new();
        let clock = TestClock::new();
        let mut act = StepActuator::new(
            pins.clone(),
            CountingWatchdog::new(),
            Arc::new(clock.clone()),
            26,
        );
        let issued = act
            .move_axis(X, Direction::Backward, 12, 10_000, &timing())
            .unwrap();
        assert_eq!(issued, 12);
        assert_eq!(pins.rising_edges(17), 12);
        assert_eq!(pins.last_level(27), Some(Level::Low));
        assert_eq!(pins.last_level(26), Some(Level::Low));
        assert!(act.is_enabled());
        assert_eq!(clock.elapsed(), Duration::from_micros(10 + 12 * 2000));
    }

    #[test]
    fn ceiling_bounds_the_move() {
        let pins = RecordingPins::new();
        let mut act = StepActuator::new(
            pins.clone(),
            CountingWatchdog::new(),
            Arc::new(TestClock::new()),
            26,
        );
        let issued = act
            .move_axis(X, Direction::Forward, 50, 10, &timing())
            .unwrap();
        assert_eq!(issued, 10);
        assert_eq!(pins.rising_edges(17), 10);
    }

    #[test]
    fn watchdog_refreshed_on_every_kth_index() {
        let wd = CountingWatchdog::new();
        let mut act = StepActuator::new(
            RecordingPins::new(),
            wd.clone(),
            Arc::new(TestClock::new()),
            26,
        );
        // indices 0, 10, 20 -> three refreshes
        act.move_axis(X, Direction::Forward, 25, 10_000, &timing())
            .unwrap();
        assert_eq!(wd.count(), 3);
    }

    #[test]
    fn move_duration_accounts_settle_and_pulses() {
        assert_eq!(timing().move_duration(50), Duration::from_micros(100_010));
    }
}
