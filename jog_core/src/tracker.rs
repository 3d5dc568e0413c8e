//! Analog-driven position tracking for one axis.
//!
//! The tracker owns the bookkeeping only: it filters samples, maps the median
//! onto the configured span and plans a bounded correction. The controller
//! performs the move and reports back how many steps were actually issued via
//! [`PositionTracker::commit`], so `current_position` never drifts from what
//! reached the driver.

use std::fmt;

use crate::actuator::Direction;
use crate::config::{MAX_TRACKING_RANGE, TrackingCfg};
use crate::error::RangeRejected;
use crate::filter::SampleFilter;
use crate::util::map_range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingMode {
    #[default]
    Idle,
    Tracking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingState {
    pub mode: TrackingMode,
    /// Logical position in steps, as issued by corrections
    pub current_position: i32,
    pub target_position: i32,
    /// Total span in steps; the target spans `-range/2..=range/2`
    pub range: i32,
    /// Time of the last correction (ms since controller epoch)
    pub last_update_ms: Option<u64>,
}

impl TrackingState {
    pub fn is_active(&self) -> bool {
        self.mode == TrackingMode::Tracking
    }
}

/// A planned corrective move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub raw: u16,
    pub median: u16,
    pub target: i32,
    pub error: i32,
    pub direction: Direction,
    pub steps: u32,
}

/// Periodic status line of the tracking loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStatus {
    pub raw: u16,
    pub median: u16,
    pub target: i32,
    pub current: i32,
    pub error: i32,
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ADC Position Control - Raw: {}, Median: {}, Target: {}, Current: {}, Error: {}",
            self.raw, self.median, self.target, self.current, self.error
        )
    }
}

/// What one tracking increment did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Inactive,
    RateLimited,
    SampleFailed,
    InDeadzone { target: i32, error: i32 },
    Corrected { issued: u32, error: i32 },
}

#[derive(Debug, Clone)]
pub struct PositionTracker {
    cfg: TrackingCfg,
    state: TrackingState,
    filter: SampleFilter,
    corrections: u64,
}

impl PositionTracker {
    pub fn new(cfg: TrackingCfg) -> Self {
        let range = cfg.default_range.clamp(1, MAX_TRACKING_RANGE);
        Self {
            cfg,
            state: TrackingState {
                mode: TrackingMode::Idle,
                current_position: 0,
                target_position: 0,
                range,
                last_update_ms: None,
            },
            filter: SampleFilter::new(),
            corrections: 0,
        }
    }

    pub fn cfg(&self) -> &TrackingCfg {
        &self.cfg
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn current_position(&self) -> i32 {
        self.state.current_position
    }

    /// Corrections committed since start.
    pub fn corrections(&self) -> u64 {
        self.corrections
    }

    pub fn activate(&mut self) {
        if !self.is_active() {
            tracing::debug!(range = self.state.range, "tracking on");
        }
        self.state.mode = TrackingMode::Tracking;
    }

    pub fn deactivate(&mut self) {
        if self.is_active() {
            tracing::debug!(position = self.state.current_position, "tracking off");
        }
        self.state.mode = TrackingMode::Idle;
    }

    /// Declare the current physical position to be zero. No movement.
    pub fn zero(&mut self) {
        self.state.current_position = 0;
    }

    pub fn range(&self) -> i32 {
        self.state.range
    }

    pub fn half_range(&self) -> i32 {
        self.state.range / 2
    }

    /// Set the total span. Returns the new half-range.
    pub fn set_range(&mut self, value: u32) -> Result<i32, RangeRejected> {
        let rejected = RangeRejected {
            value,
            max: MAX_TRACKING_RANGE,
        };
        let range = i32::try_from(value).map_err(|_| rejected)?;
        if !(1..=MAX_TRACKING_RANGE).contains(&range) {
            return Err(rejected);
        }
        self.state.range = range;
        Ok(self.half_range())
    }

    /// Whether enough time has passed since the last correction.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.state
            .last_update_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= self.cfg.update_interval_ms)
    }

    /// Map a filtered reading onto `-range/2..=range/2`, truncating.
    pub fn map_to_target(&self, median: u16) -> i32 {
        let half = i64::from(self.half_range());
        let mapped = map_range(
            i64::from(median),
            0,
            i64::from(self.cfg.adc_max),
            -half,
            half,
        );
        // |mapped| <= half for in-range samples; clamp covers readings above adc_max
        mapped.clamp(-half, half) as i32
    }

    /// Push a raw sample and return the window median.
    pub fn observe(&mut self, raw: u16) -> Option<u16> {
        self.filter.push_sample(raw);
        self.filter.filtered_value()
    }

    /// Update the target from `median` and plan a correction, or `None` when
    /// the error is inside the deadzone.
    pub fn plan(&mut self, raw: u16, median: u16) -> Option<Correction> {
        let target = self.map_to_target(median);
        self.state.target_position = target;
        let error = target.saturating_sub(self.state.current_position);
        if error.unsigned_abs() <= self.cfg.deadzone_steps {
            return None;
        }
        Some(Correction {
            raw,
            median,
            target,
            error,
            direction: Direction::toward(error),
            steps: error.unsigned_abs().min(self.cfg.max_steps_per_update),
        })
    }

    /// Account for `issued` steps of `correction` and return a status line
    /// when one is due.
    pub fn commit(
        &mut self,
        correction: &Correction,
        issued: u32,
        now_ms: u64,
    ) -> Option<TrackingStatus> {
        let delta = i32::try_from(issued).unwrap_or(i32::MAX);
        self.state.current_position = self
            .state
            .current_position
            .saturating_add(correction.direction.sign().saturating_mul(delta));
        self.state.last_update_ms = Some(now_ms);
        self.corrections += 1;
        tracing::debug!(
            target_pos = correction.target,
            current = self.state.current_position,
            error = correction.error,
            issued,
            "tracking correction"
        );

        let every = u64::from(self.cfg.status_every);
        (every > 0 && self.corrections % every == 0).then(|| TrackingStatus {
            raw: correction.raw,
            median: correction.median,
            target: correction.target,
            current: self.state.current_position,
            error: correction.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> PositionTracker {
        PositionTracker::new(TrackingCfg::default())
    }

    #[test]
    fn starts_idle_with_default_range() {
        let t = tracker();
        assert!(!t.is_active());
        assert_eq!(t.range(), 6400);
        assert_eq!(t.half_range(), 3200);
        assert_eq!(t.current_position(), 0);
    }

    #[test]
    fn maps_endpoints_and_midpoint() {
        let t = tracker();
        assert_eq!(t.map_to_target(0), -3200);
        assert_eq!(t.map_to_target(4095), 3200);
        // 2047 * 6400 / 4095 truncates to 3199
        assert_eq!(t.map_to_target(2047), -1);
        assert_eq!(t.map_to_target(u16::MAX), 3200);
    }

    #[test]
    fn deadzone_plans_nothing() {
        let mut t = tracker();
        t.set_range(8190).unwrap();
        // 2050 maps to 5 on a 8190 span
        assert_eq!(t.map_to_target(2050), 5);
        assert_eq!(t.plan(2050, 2050), None);
        assert_eq!(t.state().target_position, 5);
    }

    #[test]
    fn large_error_is_capped() {
        let mut t = tracker();
        let c = t.plan(4095, 4095).unwrap();
        assert_eq!(c.error, 3200);
        assert_eq!(c.steps, 10);
        assert_eq!(c.direction, Direction::Forward);
        t.commit(&c, c.steps, 0);
        assert_eq!(t.current_position(), 10);
    }

    #[test]
    fn partial_commit_counts_only_issued_steps() {
        let mut t = tracker();
        let c = t.plan(0, 0).unwrap();
        assert_eq!(c.direction, Direction::Backward);
        t.commit(&c, 4, 0);
        assert_eq!(t.current_position(), -4);
    }

    #[test]
    fn rate_gate_only_after_a_correction() {
        let mut t = tracker();
        assert!(t.is_due(0));
        let c = t.plan(4095, 4095).unwrap();
        t.commit(&c, 10, 100);
        assert!(!t.is_due(105));
        assert!(t.is_due(110));
    }

    #[test]
    fn status_every_nth_correction() {
        let mut t = tracker();
        let mut statuses = 0;
        for i in 0..50u64 {
            let c = t.plan(4095, 4095).unwrap();
            if t.commit(&c, c.steps, i * 10).is_some() {
                statuses += 1;
            }
        }
        assert_eq!(statuses, 2);
    }

    #[test]
    fn status_line_format() {
        let s = TrackingStatus {
            raw: 4000,
            median: 3990,
            target: 3035,
            current: 250,
            error: 2795,
        };
        assert_eq!(
            s.to_string(),
            "ADC Position Control - Raw: 4000, Median: 3990, Target: 3035, Current: 250, Error: 2795"
        );
    }

    #[test]
    fn range_bounds() {
        let mut t = tracker();
        assert!(t.set_range(0).is_err());
        assert!(t.set_range(50_001).is_err());
        assert!(t.set_range(u32::MAX).is_err());
        assert_eq!(t.range(), 6400);
        assert_eq!(t.set_range(1), Ok(0));
        assert_eq!(t.set_range(50_000), Ok(25_000));
    }

    #[test]
    fn zero_keeps_mode_and_target() {
        let mut t = tracker();
        t.activate();
        let c = t.plan(4095, 4095).unwrap();
        t.commit(&c, 10, 0);
        t.zero();
        assert_eq!(t.current_position(), 0);
        assert!(t.is_active());
        assert_eq!(t.state().target_position, 3200);
    }
}
