//! Line grammar of the manual control link.
//!
//! | line            | command                                   |
//! |-----------------|-------------------------------------------|
//! | `h` / `b`       | read hotend / bed thermistor              |
//! | `x+` `x-` `[N]` | jog (also `y`, `z`, `e`)                  |
//! | `on` / `off`    | enable / disable all drivers              |
//! | `adc_on`        | start tracking                            |
//! | `adc_off`       | stop tracking                             |
//! | `adc_zero`      | zero the tracked position                 |
//! | `adc_range[N]`  | set the tracking span, or query it        |
//! | `help`          | command summary                           |
//!
//! Matching is case-sensitive; surrounding whitespace is ignored.

use std::fmt;

use jog_traits::AnalogChannel;

use crate::actuator::Direction;
use crate::config::JogCfg;
use crate::util::leading_digits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

impl Axis {
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
            Axis::E => 'e',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            'e' => Some(Axis::E),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter().to_ascii_uppercase())
    }
}

/// How the step count of a jog was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCount {
    /// Parsed from the line.
    Given(u32),
    /// No number on the line; axis default.
    Default(u32),
    /// A suffix was present but unusable; axis default substituted.
    Substituted { steps: u32, rejected: String },
}

impl StepCount {
    pub fn steps(&self) -> u32 {
        match self {
            StepCount::Given(n) | StepCount::Default(n) => *n,
            StepCount::Substituted { steps, .. } => *steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisCommand {
    JogAxis {
        axis: Axis,
        direction: Direction,
        steps: StepCount,
    },
    EnableSteppers,
    DisableSteppers,
    ReadThermistor {
        which: AnalogChannel,
    },
    TrackingOn,
    TrackingOff,
    TrackingZero,
    /// `value` is 0 when the suffix had no digits; range checks happen on apply.
    SetRange {
        value: u32,
    },
    QueryRange,
    Help,
    Unknown {
        raw: String,
    },
}

const RANGE_PREFIX: &str = "adc_range";

impl AxisCommand {
    /// Parse one line. Blank lines yield `None`.
    pub fn parse(line: &str, jog: &JogCfg) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let fixed = match line {
            "h" => Some(AxisCommand::ReadThermistor {
                which: AnalogChannel::Hotend,
            }),
            "b" => Some(AxisCommand::ReadThermistor {
                which: AnalogChannel::Bed,
            }),
            "on" => Some(AxisCommand::EnableSteppers),
            "off" => Some(AxisCommand::DisableSteppers),
            "adc_on" => Some(AxisCommand::TrackingOn),
            "adc_off" => Some(AxisCommand::TrackingOff),
            "adc_zero" => Some(AxisCommand::TrackingZero),
            "help" => Some(AxisCommand::Help),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        if let Some(rest) = line.strip_prefix(RANGE_PREFIX) {
            return Some(if rest.is_empty() {
                AxisCommand::QueryRange
            } else {
                AxisCommand::SetRange {
                    value: leading_digits(rest).unwrap_or(0),
                }
            });
        }

        if let Some(cmd) = parse_jog(line, jog) {
            return Some(cmd);
        }

        Some(AxisCommand::Unknown {
            raw: line.to_string(),
        })
    }
}

fn parse_jog(line: &str, jog: &JogCfg) -> Option<AxisCommand> {
    let mut chars = line.chars();
    let axis = chars.next().and_then(Axis::from_letter)?;
    let direction = match chars.next()? {
        '+' => Direction::Forward,
        '-' => Direction::Backward,
        _ => return None,
    };
    // Both prefix characters are ASCII, so byte offset 2 is a char boundary.
    let suffix = &line[2..];
    let default = jog.default_steps(axis);
    let steps = if suffix.is_empty() {
        StepCount::Default(default)
    } else {
        match leading_digits(suffix) {
            Some(n) if n > 0 && n <= jog.max_steps => StepCount::Given(n),
            _ => StepCount::Substituted {
                steps: default,
                rejected: suffix.to_string(),
            },
        }
    };
    Some(AxisCommand::JogAxis {
        axis,
        direction,
        steps,
    })
}

/// Fixed command summary printed by `help`.
pub const HELP_LINES: &[&str] = &[
    "Commands:",
    "h - Read hotend thermistor",
    "b - Read bed thermistor",
    "x+[steps] - Move X positive (e.g., x+50)",
    "x-[steps] - Move X negative",
    "y+[steps] - Move Y positive",
    "y-[steps] - Move Y negative",
    "z+[steps] - Move Z up (default 10)",
    "z-[steps] - Move Z down",
    "e+[steps] - Extrude (default 50)",
    "e-[steps] - Retract",
    "on - Enable steppers",
    "off - Disable steppers",
    "adc_on - Enable ADC position control",
    "adc_off - Disable ADC position control",
    "adc_zero - Reset current position to zero",
    "adc_range[value] - Set position range",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(line: &str) -> Option<AxisCommand> {
        AxisCommand::parse(line, &JogCfg::default())
    }

    fn jog(axis: Axis, direction: Direction, steps: StepCount) -> AxisCommand {
        AxisCommand::JogAxis {
            axis,
            direction,
            steps,
        }
    }

    #[rstest]
    #[case("x+50", jog(Axis::X, Direction::Forward, StepCount::Given(50)))]
    #[case("x-", jog(Axis::X, Direction::Backward, StepCount::Default(100)))]
    #[case("y+", jog(Axis::Y, Direction::Forward, StepCount::Default(100)))]
    #[case("z-", jog(Axis::Z, Direction::Backward, StepCount::Default(10)))]
    #[case("e+", jog(Axis::E, Direction::Forward, StepCount::Default(50)))]
    #[case("e-10000", jog(Axis::E, Direction::Backward, StepCount::Given(10_000)))]
    #[case("y+25mm", jog(Axis::Y, Direction::Forward, StepCount::Given(25)))]
    #[case("  x+7  ", jog(Axis::X, Direction::Forward, StepCount::Given(7)))]
    fn jog_lines(#[case] line: &str, #[case] expected: AxisCommand) {
        assert_eq!(parse(line), Some(expected));
    }

    #[rstest]
    #[case("x+0", "0")]
    #[case("x+10001", "10001")]
    #[case("z+abc", "abc")]
    #[case("e-99999999999", "99999999999")]
    fn unusable_suffix_substitutes_default(#[case] line: &str, #[case] rejected: &str) {
        let axis = Axis::from_letter(line.chars().next().unwrap()).unwrap();
        let default = JogCfg::default().default_steps(axis);
        match parse(line) {
            Some(AxisCommand::JogAxis { steps, .. }) => {
                assert_eq!(
                    steps,
                    StepCount::Substituted {
                        steps: default,
                        rejected: rejected.to_string()
                    }
                );
            }
            other => panic!("expected jog, got {other:?}"),
        }
    }

    #[rstest]
    #[case("h", AxisCommand::ReadThermistor { which: AnalogChannel::Hotend })]
    #[case("b", AxisCommand::ReadThermistor { which: AnalogChannel::Bed })]
    #[case("on", AxisCommand::EnableSteppers)]
    #[case("off", AxisCommand::DisableSteppers)]
    #[case("adc_on", AxisCommand::TrackingOn)]
    #[case("adc_off", AxisCommand::TrackingOff)]
    #[case("adc_zero", AxisCommand::TrackingZero)]
    #[case("help", AxisCommand::Help)]
    #[case("adc_range", AxisCommand::QueryRange)]
    #[case("adc_range3200", AxisCommand::SetRange { value: 3200 })]
    #[case("adc_range0", AxisCommand::SetRange { value: 0 })]
    #[case("adc_rangeX", AxisCommand::SetRange { value: 0 })]
    fn keyword_lines(#[case] line: &str, #[case] expected: AxisCommand) {
        assert_eq!(parse(line), Some(expected));
    }

    #[rstest]
    #[case("bogus")]
    #[case("H")]
    #[case("X+50")]
    #[case("hx")]
    #[case("x")]
    #[case("x*5")]
    #[case("q+5")]
    #[case("adc_onn")]
    #[case("help me")]
    fn everything_else_is_unknown(#[case] line: &str) {
        assert_eq!(
            parse(line),
            Some(AxisCommand::Unknown {
                raw: line.to_string()
            })
        );
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   \t"), None);
    }

    #[test]
    fn help_has_a_line_per_command() {
        assert_eq!(HELP_LINES.len(), 17);
        assert_eq!(HELP_LINES[0], "Commands:");
    }
}
