//! Thermistor voltage-divider estimate.
//!
//! The thermistor sits between the ADC pin and ground with a pull-up to the
//! supply, so `V = V_supply * R / (R_pullup + R)` which inverts to
//! `R = V * R_pullup / (V_supply - V)`.
//!
//! The estimate is display-only: open and short circuits are represented by
//! sentinel values, never by errors.

use std::fmt;

pub const DEFAULT_SUPPLY_V: f32 = 3.3;
pub const DEFAULT_PULLUP_OHMS: f32 = 4700.0;
pub const DEFAULT_ADC_MAX: u16 = 4095;

/// Returned for a reading at or below 0 V (nothing pulling the pin down).
pub const OPEN_CIRCUIT_OHMS: f32 = f32::INFINITY;
/// Anything above this is shown as `OPEN`.
pub const OPEN_DISPLAY_THRESHOLD_OHMS: f32 = 999_999.0;
/// Anything below this is shown as `SHORT`.
pub const SHORT_DISPLAY_THRESHOLD_OHMS: f32 = 1.0;

/// Resistance for a divider on the default 3.3 V supply.
#[inline]
pub fn calculate_resistance(voltage: f32, pullup_ohms: f32) -> f32 {
    Divider::new(DEFAULT_SUPPLY_V, pullup_ohms, DEFAULT_ADC_MAX).resistance(voltage)
}

/// Pull-up divider parameters of one analog input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divider {
    pub supply_v: f32,
    pub pullup_ohms: f32,
    pub adc_max: u16,
}

impl Default for Divider {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPLY_V, DEFAULT_PULLUP_OHMS, DEFAULT_ADC_MAX)
    }
}

impl Divider {
    pub fn new(supply_v: f32, pullup_ohms: f32, adc_max: u16) -> Self {
        Self {
            supply_v,
            pullup_ohms,
            adc_max,
        }
    }

    /// Convert a raw ADC count to volts. Counts above full scale clamp to the supply.
    pub fn voltage(&self, raw: u16) -> f32 {
        let max = self.adc_max.max(1);
        f32::from(raw.min(max)) * self.supply_v / f32::from(max)
    }

    /// Estimated resistance in ohms. Saturates instead of failing:
    /// `0.0` at or above the supply (short), `OPEN_CIRCUIT_OHMS` at or below 0 V.
    pub fn resistance(&self, voltage: f32) -> f32 {
        if voltage.is_nan() {
            return OPEN_CIRCUIT_OHMS;
        }
        if voltage >= self.supply_v {
            return 0.0;
        }
        if voltage <= 0.0 {
            return OPEN_CIRCUIT_OHMS;
        }
        (voltage * self.pullup_ohms) / (self.supply_v - voltage)
    }

    /// Sample, voltage and estimate bundled for display.
    pub fn reading(&self, raw: u16) -> ThermistorReading {
        let voltage = self.voltage(raw);
        ThermistorReading {
            raw,
            voltage,
            ohms: Ohms(self.resistance(voltage)),
        }
    }
}

/// Display wrapper: `OPEN`, `SHORT`, `12.34kΩ` or `850.00Ω`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ohms(pub f32);

impl Ohms {
    pub fn is_open(self) -> bool {
        self.0 > OPEN_DISPLAY_THRESHOLD_OHMS
    }

    pub fn is_short(self) -> bool {
        self.0 < SHORT_DISPLAY_THRESHOLD_OHMS
    }
}

impl fmt::Display for Ohms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() {
            f.write_str("OPEN")
        } else if self.is_short() {
            f.write_str("SHORT")
        } else if self.0 >= 1000.0 {
            write!(f, "{:.2}kΩ", self.0 / 1000.0)
        } else {
            write!(f, "{:.2}Ω", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermistorReading {
    pub raw: u16,
    pub voltage: f32,
    pub ohms: Ohms,
}

impl ThermistorReading {
    /// Diagnostic line, e.g. `Bed ADC Input - ADC: 2048, Voltage: 1.65V, Calculated R: 4.70kΩ`.
    pub fn describe(&self, label: &str) -> String {
        format!(
            "{label} ADC Input - ADC: {}, Voltage: {:.2}V, Calculated R: {}",
            self.raw, self.voltage, self.ohms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturates_at_rails() {
        assert_eq!(calculate_resistance(3.3, 4700.0), 0.0);
        assert_eq!(calculate_resistance(5.0, 4700.0), 0.0);
        assert_eq!(calculate_resistance(0.0, 4700.0), OPEN_CIRCUIT_OHMS);
        assert_eq!(calculate_resistance(-0.2, 4700.0), OPEN_CIRCUIT_OHMS);
        assert_eq!(calculate_resistance(f32::NAN, 4700.0), OPEN_CIRCUIT_OHMS);
    }

    #[test]
    fn half_supply_equals_pullup() {
        let r = calculate_resistance(1.65, 4700.0);
        assert!((r - 4700.0).abs() < 0.5, "got {r}");
    }

    #[test]
    fn display_bands() {
        assert_eq!(Ohms(OPEN_CIRCUIT_OHMS).to_string(), "OPEN");
        assert_eq!(Ohms(2_000_000.0).to_string(), "OPEN");
        assert_eq!(Ohms(0.0).to_string(), "SHORT");
        assert_eq!(Ohms(4700.0).to_string(), "4.70kΩ");
        assert_eq!(Ohms(850.0).to_string(), "850.00Ω");
    }

    #[test]
    fn reading_line_format() {
        let d = Divider::default();
        let line = d.reading(0).describe("Hotend");
        assert_eq!(
            line,
            "Hotend ADC Input - ADC: 0, Voltage: 0.00V, Calculated R: OPEN"
        );
        let line = d.reading(4095).describe("Bed");
        assert!(line.ends_with("Calculated R: SHORT"), "{line}");
    }
}
