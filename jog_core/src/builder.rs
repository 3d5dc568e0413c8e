//! Type-state builder for `Controller`.
//!
//! Pins, analog input and watchdog must be supplied before `build()` exists;
//! the placeholder `Missing` implements none of the hardware traits.
//! Console, clock and configuration fall back to stdout, the monotonic clock
//! and `ControllerCfg::default()`.

use std::sync::Arc;

use jog_traits::clock::{Clock, MonotonicClock};
use jog_traits::{AnalogInput, PinBank, Watchdog};

use crate::config::{ControllerCfg, MAX_TRACKING_RANGE};
use crate::console::{Console, StdoutConsole};
use crate::controller::Controller;
use crate::error::{BuildError, Result};

/// Placeholder for a handle that has not been provided yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct Missing;

pub struct ControllerBuilder<P, A, W> {
    pins: P,
    analog: A,
    watchdog: W,
    console: Option<Box<dyn Console>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    cfg: ControllerCfg,
}

impl Default for ControllerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerBuilder<Missing, Missing, Missing> {
    pub fn new() -> Self {
        Self {
            pins: Missing,
            analog: Missing,
            watchdog: Missing,
            console: None,
            clock: None,
            cfg: ControllerCfg::default(),
        }
    }
}

impl<P, A, W> ControllerBuilder<P, A, W> {
    pub fn with_pins<Q: PinBank>(self, pins: Q) -> ControllerBuilder<Q, A, W> {
        ControllerBuilder {
            pins,
            analog: self.analog,
            watchdog: self.watchdog,
            console: self.console,
            clock: self.clock,
            cfg: self.cfg,
        }
    }

    pub fn with_analog<B: AnalogInput>(self, analog: B) -> ControllerBuilder<P, B, W> {
        ControllerBuilder {
            pins: self.pins,
            analog,
            watchdog: self.watchdog,
            console: self.console,
            clock: self.clock,
            cfg: self.cfg,
        }
    }

    pub fn with_watchdog<V: Watchdog>(self, watchdog: V) -> ControllerBuilder<P, A, V> {
        ControllerBuilder {
            pins: self.pins,
            analog: self.analog,
            watchdog,
            console: self.console,
            clock: self.clock,
            cfg: self.cfg,
        }
    }

    pub fn with_console<C: Console + 'static>(mut self, console: C) -> Self {
        self.console = Some(Box::new(console));
        self
    }

    /// Inject a custom clock (tests use `TestClock`).
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_config(mut self, cfg: ControllerCfg) -> Self {
        self.cfg = cfg;
        self
    }
}

impl<P: PinBank, A: AnalogInput, W: Watchdog> ControllerBuilder<P, A, W> {
    /// Validate the configuration and assemble the controller. Drivers stay
    /// untouched until `Controller::init`.
    pub fn build(self) -> Result<Controller<P, A, W>> {
        validate(&self.cfg).map_err(eyre::Report::new)?;
        let console = self
            .console
            .unwrap_or_else(|| Box::new(StdoutConsole) as Box<dyn Console>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()) as Arc<dyn Clock + Send + Sync>);
        Ok(Controller::new(
            self.pins,
            self.analog,
            self.watchdog,
            console,
            clock,
            self.cfg,
        ))
    }
}

fn validate(cfg: &ControllerCfg) -> std::result::Result<(), BuildError> {
    let t = &cfg.timing;
    if t.pulse_high_us < 500 {
        return Err(BuildError::InvalidConfig("pulse_high_us must be >= 500"));
    }
    if t.dir_settle_us < 10 {
        return Err(BuildError::InvalidConfig("dir_settle_us must be >= 10"));
    }
    if t.jog_watchdog_every == 0 || t.track_watchdog_every == 0 {
        return Err(BuildError::InvalidConfig(
            "watchdog intervals must be >= 1",
        ));
    }

    let jog = &cfg.jog;
    if jog.max_steps == 0 {
        return Err(BuildError::InvalidConfig("jog max_steps must be >= 1"));
    }
    for d in [jog.xy_default_steps, jog.z_default_steps, jog.e_default_steps] {
        if d == 0 || d > jog.max_steps {
            return Err(BuildError::InvalidConfig(
                "jog default steps must be in 1..=max_steps",
            ));
        }
    }

    let tr = &cfg.tracking;
    if !(1..=MAX_TRACKING_RANGE).contains(&tr.default_range) {
        return Err(BuildError::InvalidConfig(
            "tracking default_range must be in 1..=50000",
        ));
    }
    if tr.max_steps_per_update == 0 {
        return Err(BuildError::InvalidConfig(
            "tracking max_steps_per_update must be >= 1",
        ));
    }
    if tr.adc_max == 0 {
        return Err(BuildError::InvalidConfig("tracking adc_max must be > 0"));
    }

    let th = &cfg.thermistor;
    if !(th.supply_v.is_finite() && th.supply_v > 0.0) {
        return Err(BuildError::InvalidConfig("thermistor supply_v must be > 0"));
    }
    if !(th.pullup_ohms.is_finite() && th.pullup_ohms > 0.0) {
        return Err(BuildError::InvalidConfig(
            "thermistor pullup_ohms must be > 0",
        ));
    }

    if cfg.line_capacity == 0 {
        return Err(BuildError::InvalidConfig("line_capacity must be >= 1"));
    }

    let p = &cfg.pins;
    let axis_pins = [p.x, p.y, p.z, p.e];
    if axis_pins
        .iter()
        .any(|a| a.step == p.enable || a.dir == p.enable)
    {
        return Err(BuildError::InvalidConfig(
            "enable pin collides with an axis pin",
        ));
    }
    if axis_pins.iter().any(|a| a.step == a.dir) {
        return Err(BuildError::InvalidConfig(
            "step and dir must be different pins",
        ));
    }
    Ok(())
}
