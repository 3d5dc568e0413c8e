#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the manual axis controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section has defaults, so an empty document is a valid config
//!   describing the reference wiring.
//! - Nothing here is ever written back: runtime changes such as the tracking
//!   range live only in the controller.
use serde::Deserialize;
use std::path::Path;

/// Step/dir pair for one axis.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AxisPins {
    pub step: u8,
    pub dir: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    /// Shared enable line for all drivers (active low)
    pub enable: u8,
    pub x: AxisPins,
    pub y: AxisPins,
    pub z: AxisPins,
    pub e: AxisPins,
}

impl Default for Pins {
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

/// MCP3208 wiring for the two analog inputs.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Analog {
    pub spi_bus: u8,
    pub spi_slave_select: u8,
    pub spi_clock_hz: u32,
    pub hotend_channel: u8,
    pub bed_channel: u8,
}

impl Default for Analog {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            spi_slave_select: 0,
            spi_clock_hz: 1_000_000,
            hotend_channel: 0,
            bed_channel: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Thermistor {
    pub supply_v: f32,
    pub pullup_ohms: f32,
    /// Full-scale ADC count
    pub adc_max: u16,
}

impl Default for Thermistor {
    fn default() -> Self {
        Self {
            supply_v: 3.3,
            pullup_ohms: 4700.0,
            adc_max: 4095,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub dir_settle_us: u32,
    pub pulse_high_us: u32,
    /// Trailing low period for operator jogs
    pub jog_low_us: u32,
    /// Trailing low period for tracking corrections
    pub track_low_us: u32,
    pub jog_watchdog_every: u32,
    pub track_watchdog_every: u32,
}

impl Default for Timing {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Jog {
    pub xy_default_steps: u32,
    pub z_default_steps: u32,
    pub e_default_steps: u32,
    /// Largest accepted step count in a single jog command
    pub max_steps: u32,
}

impl Default for Jog {
    fn default() -> Self {
        Self {
            xy_default_steps: 100,
            z_default_steps: 10,
            e_default_steps: 50,
            max_steps: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    X,
    #[default]
    Y,
    Z,
    E,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JogPolicy {
    /// Leave tracking before jogging the tracked axis
    #[default]
    DropTracking,
    /// Refuse jogs of the tracked axis while tracking
    RejectJog,
    /// Jog anyway; the tracked position drifts
    Allow,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Tracking {
    pub axis: AxisName,
    /// Total span in steps mapped onto the ADC range
    pub default_range: i32,
    pub deadzone_steps: u32,
    pub max_steps_per_update: u32,
    pub update_interval_ms: u64,
    /// Emit a status line every N corrections (0 disables)
    pub status_every: u32,
    pub jog_policy: JogPolicy,
}

impl Default for Tracking {
    fn default() -> Self {
        Self {
            axis: AxisName::Y,
            default_range: 6400,
            deadzone_steps: 5,
            max_steps_per_update: 10,
            update_interval_ms: 10,
            status_every: 25,
            jog_policy: JogPolicy::DropTracking,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Serial {
    /// Longest command line kept; extra bytes are dropped
    pub line_capacity: usize,
    pub device: String,
    pub baud: u32,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            line_capacity: 31,
            device: "/dev/serial0".to_string(),
            baud: 115_200,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Runner {
    /// Sleep between ticks (µs)
    pub idle_us: u64,
    /// Ticks longer than this are counted as overruns (ms)
    pub tick_budget_ms: u64,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            idle_us: 1000,
            tick_budget_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct WatchdogCfg {
    /// Watchdog character device, e.g. /dev/watchdog. Absent disables it.
    pub device: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub analog: Analog,
    pub thermistor: Thermistor,
    pub timing: Timing,
    pub jog: Jog,
    pub tracking: Tracking,
    pub serial: Serial,
    pub runner: Runner,
    pub watchdog: WatchdogCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Upper bound for the tracking range, shared with the `adc_range` command.
pub const MAX_TRACKING_RANGE: i32 = 50_000;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let p = &self.pins;
        let mut used = vec![p.enable];
        for (name, axis) in [("x", p.x), ("y", p.y), ("z", p.z), ("e", p.e)] {
            if axis.step == axis.dir {
                eyre::bail!("pins.{name}: step and dir must be different pins");
            }
            used.push(axis.step);
            used.push(axis.dir);
        }
        let mut sorted = used.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != used.len() {
            eyre::bail!("pins: every output (enable, step, dir) must use a distinct pin");
        }

        // Analog
        if self.analog.hotend_channel > 7 || self.analog.bed_channel > 7 {
            eyre::bail!("analog channels must be in 0..=7");
        }
        if self.analog.hotend_channel == self.analog.bed_channel {
            eyre::bail!("analog.hotend_channel and analog.bed_channel must differ");
        }
        if self.analog.spi_clock_hz == 0 {
            eyre::bail!("analog.spi_clock_hz must be > 0");
        }

        // Thermistor
        if !(self.thermistor.supply_v.is_finite() && self.thermistor.supply_v > 0.0) {
            eyre::bail!("thermistor.supply_v must be > 0");
        }
        if !(self.thermistor.pullup_ohms.is_finite() && self.thermistor.pullup_ohms > 0.0) {
            eyre::bail!("thermistor.pullup_ohms must be > 0");
        }
        if self.thermistor.adc_max == 0 {
            eyre::bail!("thermistor.adc_max must be >= 1");
        }

        // Timing
        if self.timing.pulse_high_us < 500 {
            eyre::bail!("timing.pulse_high_us must be >= 500");
        }
        if self.timing.dir_settle_us < 10 {
            eyre::bail!("timing.dir_settle_us must be >= 10");
        }
        if self.timing.jog_low_us == 0 || self.timing.track_low_us == 0 {
            eyre::bail!("timing.jog_low_us and timing.track_low_us must be >= 1");
        }
        if self.timing.jog_watchdog_every == 0 || self.timing.track_watchdog_every == 0 {
            eyre::bail!("timing watchdog intervals must be >= 1");
        }

        // Jog
        if self.jog.max_steps == 0 {
            eyre::bail!("jog.max_steps must be >= 1");
        }
        for (name, v) in [
            ("xy_default_steps", self.jog.xy_default_steps),
            ("z_default_steps", self.jog.z_default_steps),
            ("e_default_steps", self.jog.e_default_steps),
        ] {
            if v == 0 || v > self.jog.max_steps {
                eyre::bail!("jog.{name} must be in 1..=jog.max_steps");
            }
        }

        // Tracking
        if !(1..=MAX_TRACKING_RANGE).contains(&self.tracking.default_range) {
            eyre::bail!("tracking.default_range must be in 1..={MAX_TRACKING_RANGE}");
        }
        if self.tracking.max_steps_per_update == 0 {
            eyre::bail!("tracking.max_steps_per_update must be >= 1");
        }
        if self.tracking.update_interval_ms > 60_000 {
            eyre::bail!("tracking.update_interval_ms is unreasonably large (>60s)");
        }

        // Serial
        if self.serial.line_capacity == 0 {
            eyre::bail!("serial.line_capacity must be >= 1");
        }
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }

        // Runner
        if self.runner.idle_us > 1_000_000 {
            eyre::bail!("runner.idle_us is unreasonably large (>1s)");
        }
        if self.runner.tick_budget_ms == 0 {
            eyre::bail!("runner.tick_budget_ms must be >= 1");
        }

        Ok(())
    }
}
