#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Manual axis control engine (hardware-agnostic).
//!
//! Every hardware interaction goes through the `jog_traits` seams
//! (`PinBank`, `AnalogInput`, `Watchdog`, `SerialSource`, `Clock`), so the same
//! controller runs against GPIO on a Pi, the simulator, or test mocks.
//!
//! ## Architecture
//!
//! - **Filtering**: 8-sample median window (`filter`)
//! - **Actuation**: blocking step/dir pulse trains with watchdog refresh (`actuator`)
//! - **Tracking**: analog-target position bookkeeping with deadzone and per-update cap (`tracker`)
//! - **Commands**: line assembly (`line`), grammar (`command`), interpreter (`controller`)
//! - **Diagnostics**: thermistor divider math (`resistance`), operator console (`console`)
//! - **Loop**: background serial feeder (`feeder`) and the tick loop (`runner`)
//!
//! Build a controller with [`ControllerBuilder`]; see `jog_cli` for wiring.

pub mod actuator;
pub mod builder;
pub mod command;
pub mod config;
pub mod console;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod feeder;
pub mod filter;
pub mod hw_error;
pub mod line;
pub mod mocks;
pub mod resistance;
pub mod runner;
pub mod tracker;
pub mod util;

pub use actuator::{Direction, StepActuator};
pub use builder::{ControllerBuilder, Missing};
pub use command::{Axis, AxisCommand, StepCount};
pub use config::{
    AxisPins, ControllerCfg, JogCfg, JogPolicy, PinMap, PulseTiming, RunnerCfg, TimingCfg,
    TrackingCfg,
};
pub use console::{Console, StdoutConsole, TranscriptConsole};
pub use controller::{Controller, TickReport};
pub use error::{BuildError, JogError, MoveFault, RangeRejected, Result};
pub use feeder::ByteFeeder;
pub use filter::SampleFilter;
pub use line::LineAssembler;
pub use resistance::{Divider, Ohms, ThermistorReading, calculate_resistance};
pub use runner::{RunStats, run};
pub use tracker::{PositionTracker, TickOutcome, TrackingMode, TrackingState, TrackingStatus};
