use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum JogError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// A move that stopped early because an output write failed.
///
/// `issued` counts the step pulses that reached the driver before the fault.
#[derive(Debug, Error, Clone)]
#[error("move stopped after {issued} of {requested} steps: {error}")]
pub struct MoveFault {
    pub issued: u32,
    pub requested: u32,
    #[source]
    pub error: JogError,
}

/// `adc_range` value outside the accepted span.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("range {value} outside 1..={max}")]
pub struct RangeRejected {
    pub value: u32,
    pub max: i32,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
