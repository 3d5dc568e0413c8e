//! Cooperative tick loop.
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jog_traits::{AnalogInput, PinBank, SerialSource, Watchdog};

use crate::config::RunnerCfg;
use crate::controller::Controller;
use crate::tracker::TickOutcome;
use crate::util::MICROS_PER_MILLI;

/// Counters collected over one `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub corrections: u64,
    pub lines: u64,
    /// Longest single tick (µs), moves included
    pub max_tick_us: u64,
    /// Ticks that took longer than the configured budget
    pub overruns: u64,
}

impl RunStats {
    fn record(&mut self, outcome: TickOutcome, lines: usize, tick_us: u64, budget_us: u64) {
        self.ticks += 1;
        if matches!(outcome, TickOutcome::Corrected { .. }) {
            self.corrections += 1;
        }
        self.lines += lines as u64;
        self.max_tick_us = self.max_tick_us.max(tick_us);
        if budget_us > 0 && tick_us > budget_us {
            self.overruns += 1;
        }
    }
}

/// Tick `controller` until `shutdown` is set, or, with `exit_on_eof`, until
/// `serial` reports it is closed. Sleeps `idle_us` on the controller's clock
/// between ticks.
pub fn run<P, A, W, S>(
    controller: &mut Controller<P, A, W>,
    serial: &mut S,
    shutdown: &AtomicBool,
    cfg: &RunnerCfg,
) -> RunStats
where
    P: PinBank,
    A: AnalogInput,
    W: Watchdog,
    S: SerialSource + ?Sized,
{
    let clock = controller.clock().clone();
    let budget_us = cfg.tick_budget_ms.saturating_mul(MICROS_PER_MILLI);
    let idle = Duration::from_micros(cfg.idle_us);
    let mut stats = RunStats::default();
    tracing::info!(idle_us = cfg.idle_us, budget_ms = cfg.tick_budget_ms, "run start");

    while !shutdown.load(Ordering::Relaxed) {
        let started = clock.now();
        let report = controller.tick(serial);
        let tick_us = u64::try_from(clock.now().saturating_duration_since(started).as_micros())
            .unwrap_or(u64::MAX);
        if budget_us > 0 && tick_us > budget_us {
            tracing::debug!(tick_us, budget_us, "tick overrun");
        }
        stats.record(report.tracking, report.lines, tick_us, budget_us);

        if cfg.exit_on_eof && serial.is_closed() {
            tracing::debug!("serial input closed");
            break;
        }
        if !idle.is_zero() {
            clock.sleep(idle);
        }
    }

    tracing::info!(
        ticks = stats.ticks,
        corrections = stats.corrections,
        lines = stats.lines,
        max_tick_us = stats.max_tick_us,
        overruns = stats.overruns,
        "run stop"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overruns_only_past_budget() {
        let mut s = RunStats::default();
        s.record(TickOutcome::Inactive, 0, 50_000, 50_000);
        s.record(TickOutcome::Inactive, 2, 50_001, 50_000);
        s.record(TickOutcome::Corrected { issued: 3, error: 9 }, 0, 10, 0);
        assert_eq!(s.ticks, 3);
        assert_eq!(s.overruns, 1);
        assert_eq!(s.lines, 2);
        assert_eq!(s.corrections, 1);
        assert_eq!(s.max_tick_us, 50_001);
    }
}
