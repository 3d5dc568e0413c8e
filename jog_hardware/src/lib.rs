pub mod error;
pub mod mcp3208;
#[cfg(feature = "hardware")]
pub mod pi;
pub mod watchdog;

use std::collections::HashMap;

use jog_traits::{AnalogChannel, AnalogInput, Level, PinBank, Watchdog};

pub use watchdog::DevWatchdog;

/// Environment overrides for the simulated analog inputs.
pub const ENV_SIM_HOTEND: &str = "JOG_SIM_HOTEND";
pub const ENV_SIM_BED: &str = "JOG_SIM_BED";

/// Simulated output bank: remembers the last level of every pin.
#[derive(Debug, Default)]
pub struct SimulatedPins {
    levels: HashMap<u8, Level>,
    rising: HashMap<u8, u64>,
    writes: u64,
}

impl SimulatedPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, pin: u8) -> Option<Level> {
        self.levels.get(&pin).copied()
    }

    /// Low-to-high transitions seen on `pin`.
    pub fn pulses(&self, pin: u8) -> u64 {
        self.rising.get(&pin).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl PinBank for SimulatedPins {
    fn write(
        &mut self,
        pin: u8,
        level: Level,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let prev = self.levels.insert(pin, level).unwrap_or(Level::Low);
        if prev == Level::Low && level == Level::High {
            *self.rising.entry(pin).or_default() += 1;
        }
        self.writes += 1;
        Ok(())
    }
}

/// Simulated analog front end with fixed readings and optional jitter.
#[derive(Debug, Clone)]
pub struct SimulatedAnalog {
    hotend: u16,
    bed: u16,
    noise: u16,
    rng: u32,
}

impl Default for SimulatedAnalog {
    fn default() -> Self {
        // mid-scale: ~4.7 kΩ on the thermistor inputs, centered tracking target
        Self::new(2048, 2048)
    }
}

impl SimulatedAnalog {
    pub fn new(hotend: u16, bed: u16) -> Self {
        Self {
            hotend: hotend.min(mcp3208::FULL_SCALE),
            bed: bed.min(mcp3208::FULL_SCALE),
            noise: 0,
            rng: 0x9E37_79B9,
        }
    }

    /// Defaults, overridden by `JOG_SIM_HOTEND` / `JOG_SIM_BED` when they parse.
    pub fn from_env() -> Self {
        let d = Self::default();
        let var = |name: &str, fallback: u16| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.trim().parse::<u16>().ok())
                .unwrap_or(fallback)
        };
        Self::new(var(ENV_SIM_HOTEND, d.hotend), var(ENV_SIM_BED, d.bed))
    }

    /// Add uniform jitter of up to `±amplitude` counts to every reading.
    pub fn with_noise(mut self, amplitude: u16) -> Self {
        self.noise = amplitude;
        self
    }

    pub fn set(&mut self, channel: AnalogChannel, value: u16) {
        let value = value.min(mcp3208::FULL_SCALE);
        match channel {
            AnalogChannel::Hotend => self.hotend = value,
            AnalogChannel::Bed => self.bed = value,
        }
    }

    fn jitter(&mut self) -> i32 {
        if self.noise == 0 {
            return 0;
        }
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        let span = u32::from(self.noise) * 2 + 1;
        (x % span) as i32 - i32::from(self.noise)
    }
}

impl AnalogInput for SimulatedAnalog {
    fn read(
        &mut self,
        channel: AnalogChannel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        let base = match channel {
            AnalogChannel::Hotend => self.hotend,
            AnalogChannel::Bed => self.bed,
        };
        let value = (i32::from(base) + self.jitter()).clamp(0, i32::from(mcp3208::FULL_SCALE));
        Ok(value as u16)
    }
}

/// Watchdog stand-in that only counts keepalives.
#[derive(Debug, Default)]
pub struct SimulatedWatchdog {
    refreshes: u64,
}

impl SimulatedWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

impl Watchdog for SimulatedWatchdog {
    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}
