//! Maps `Box<dyn Error>` from trait boundaries to typed `JogError`.
//!
//! The traits in `jog_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `jog_hardware::HwError` downcasting.

use crate::error::JogError;

/// Map a trait-boundary error to a typed `JogError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> JogError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<jog_hardware::error::HwError>() {
            return match hw {
                jog_hardware::error::HwError::Io(io) => JogError::Io(io.to_string()),
                other => JogError::HardwareFault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return JogError::Io(io.to_string());
    }
    JogError::Hardware(e.to_string())
}

/// Convenience for the boxed errors returned by `jog_traits` implementations.
#[inline]
pub fn map_boxed(e: Box<dyn std::error::Error + Send + Sync>) -> JogError {
    map_hw_error(&*e)
}
