//! `From` implementations bridging `jog_config` types to `jog_core` types.

use crate::command::Axis;
use crate::config::{AxisPins, ControllerCfg, JogCfg, PinMap, RunnerCfg, TimingCfg, TrackingCfg};
use crate::resistance::Divider;

// ── Pins ─────────────────────────────────────────────────────────────────────

impl From<jog_config::AxisPins> for AxisPins {
    fn from(p: jog_config::AxisPins) -> Self {
        Self {
            step: p.step,
            dir: p.dir,
        }
    }
}

impl From<&jog_config::Pins> for PinMap {
    fn from(p: &jog_config::Pins) -> Self {
        Self {
            enable: p.enable,
            x: p.x.into(),
            y: p.y.into(),
            z: p.z.into(),
            e: p.e.into(),
        }
    }
}

// ── Timing / jog ─────────────────────────────────────────────────────────────

impl From<&jog_config::Timing> for TimingCfg {
    fn from(t: &jog_config::Timing) -> Self {
        Self {
            dir_settle_us: t.dir_settle_us,
            pulse_high_us: t.pulse_high_us,
            jog_low_us: t.jog_low_us,
            track_low_us: t.track_low_us,
            jog_watchdog_every: t.jog_watchdog_every,
            track_watchdog_every: t.track_watchdog_every,
        }
    }
}

impl From<&jog_config::Jog> for JogCfg {
    fn from(j: &jog_config::Jog) -> Self {
        Self {
            xy_default_steps: j.xy_default_steps,
            z_default_steps: j.z_default_steps,
            e_default_steps: j.e_default_steps,
            max_steps: j.max_steps,
        }
    }
}

// ── Tracking ─────────────────────────────────────────────────────────────────

impl From<jog_config::AxisName> for Axis {
    fn from(a: jog_config::AxisName) -> Self {
        match a {
            jog_config::AxisName::X => Axis::X,
            jog_config::AxisName::Y => Axis::Y,
            jog_config::AxisName::Z => Axis::Z,
            jog_config::AxisName::E => Axis::E,
        }
    }
}

/// Tracking needs the ADC full scale from `[thermistor]` as well.
impl From<&jog_config::Config> for TrackingCfg {
    fn from(c: &jog_config::Config) -> Self {
        let t = &c.tracking;
        Self {
            axis: t.axis.into(),
            default_range: t.default_range,
            deadzone_steps: t.deadzone_steps,
            max_steps_per_update: t.max_steps_per_update,
            update_interval_ms: t.update_interval_ms,
            status_every: t.status_every,
            adc_max: c.thermistor.adc_max,
            jog_policy: t.jog_policy,
        }
    }
}

impl From<&jog_config::Thermistor> for Divider {
    fn from(t: &jog_config::Thermistor) -> Self {
        Divider::new(t.supply_v, t.pullup_ohms, t.adc_max)
    }
}

// ── Whole controller ─────────────────────────────────────────────────────────

impl From<&jog_config::Config> for ControllerCfg {
    fn from(c: &jog_config::Config) -> Self {
        Self {
            pins: (&c.pins).into(),
            timing: (&c.timing).into(),
            jog: (&c.jog).into(),
            tracking: c.into(),
            thermistor: (&c.thermistor).into(),
            line_capacity: c.serial.line_capacity,
        }
    }
}

impl From<&jog_config::Runner> for RunnerCfg {
    fn from(r: &jog_config::Runner) -> Self {
        Self {
            idle_us: r.idle_us,
            tick_budget_ms: r.tick_budget_ms,
            exit_on_eof: false,
        }
    }
}
