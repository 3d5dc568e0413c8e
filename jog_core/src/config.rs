//! Runtime configuration consumed by the controller.
//!
//! These mirror the TOML schema in `jog_config` but hold only what the engine
//! needs; see `conversions` for the mapping.

use std::time::Duration;

use crate::command::Axis;
use crate::resistance::Divider;

pub use jog_config::{JogPolicy, MAX_TRACKING_RANGE};

/// Step/dir pair for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPins {
    pub step: u8,
    pub dir: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinMap {
    /// Shared driver enable, active low
    pub enable: u8,
    pub x: AxisPins,
    pub y: AxisPins,
    pub z: AxisPins,
    pub e: AxisPins,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            enable: 26,
            x: AxisPins { step: 17, dir: 27 },
            y: AxisPins { step: 22, dir: 23 },
            z: AxisPins { step: 24, dir: 25 },
            e: AxisPins { step: 5, dir: 6 },
        }
    }
}

impl PinMap {
    pub fn axis(&self, axis: Axis) -> AxisPins {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::E => self.e,
        }
    }
}

/// Timing of one step pulse train.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTiming {
    pub dir_settle_us: u32,
    pub pulse_high_us: u32,
    pub pulse_low_us: u32,
    /// Refresh the watchdog on pulse indices divisible by this
    pub watchdog_every: u32,
}

impl PulseTiming {
    /// Wall time a move of `steps` holds the processor.
    pub fn move_duration(&self, steps: u32) -> Duration {
        let per_step = u64::from(self.pulse_high_us) + u64::from(self.pulse_low_us);
        Duration::from_micros(
            u64::from(self.dir_settle_us).saturating_add(per_step.saturating_mul(u64::from(steps))),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingCfg {
    pub dir_settle_us: u32,
    pub pulse_high_us: u32,
    pub jog_low_us: u32,
    pub track_low_us: u32,
    pub jog_watchdog_every: u32,
    pub track_watchdog_every: u32,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            dir_settle_us: 10,
            pulse_high_us: 500,
            jog_low_us: 1500,
            track_low_us: 500,
            jog_watchdog_every: 10,
            track_watchdog_every: 5,
        }
    }
}

impl TimingCfg {
    pub fn jog_pulse(&self) -> PulseTiming {
        PulseTiming {
            dir_settle_us: self.dir_settle_us,
            pulse_high_us: self.pulse_high_us,
            pulse_low_us: self.jog_low_us,
            watchdog_every: self.jog_watchdog_every.max(1),
        }
    }

    pub fn track_pulse(&self) -> PulseTiming {
        PulseTiming {
            dir_settle_us: self.dir_settle_us,
            pulse_high_us: self.pulse_high_us,
            pulse_low_us: self.track_low_us,
            watchdog_every: self.track_watchdog_every.max(1),
        }
    }
}

/// Step counts used when a jog command carries no (valid) number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JogCfg {
    pub xy_default_steps: u32,
    pub z_default_steps: u32,
    pub e_default_steps: u32,
    pub max_steps: u32,
}

impl Default for JogCfg {
    fn default() -> Self {
        Self {
            xy_default_steps: 100,
            z_default_steps: 10,
            e_default_steps: 50,
            max_steps: 10_000,
        }
    }
}

impl JogCfg {
    pub fn default_steps(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X | Axis::Y => self.xy_default_steps,
            Axis::Z => self.z_default_steps,
            Axis::E => self.e_default_steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingCfg {
    pub axis: Axis,
    pub default_range: i32,
    pub deadzone_steps: u32,
    pub max_steps_per_update: u32,
    pub update_interval_ms: u64,
    /// Status line every N corrections; 0 disables
    pub status_every: u32,
    /// Full-scale count of the tracking input
    pub adc_max: u16,
    pub jog_policy: JogPolicy,
}

impl Default for TrackingCfg {
    fn default() -> Self {
        Self {
            axis: Axis::Y,
            default_range: 6400,
            deadzone_steps: 5,
            max_steps_per_update: 10,
            update_interval_ms: 10,
            status_every: 25,
            adc_max: 4095,
            jog_policy: JogPolicy::DropTracking,
        }
    }
}

/// Everything the controller needs besides its I/O handles.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerCfg {
    pub pins: PinMap,
    pub timing: TimingCfg,
    pub jog: JogCfg,
    pub tracking: TrackingCfg,
    pub thermistor: Divider,
    pub line_capacity: usize,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            pins: PinMap::default(),
            timing: TimingCfg::default(),
            jog: JogCfg::default(),
            tracking: TrackingCfg::default(),
            thermistor: Divider::default(),
            line_capacity: crate::line::DEFAULT_LINE_CAPACITY,
        }
    }
}

/// Tick loop pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCfg {
    /// Sleep between ticks (µs)
    pub idle_us: u64,
    /// Ticks longer than this count as overruns (ms)
    pub tick_budget_ms: u64,
    /// Stop once the serial source reports it is closed
    pub exit_on_eof: bool,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            idle_us: 1000,
            tick_budget_ms: 50,
            exit_on_eof: false,
        }
    }
}
