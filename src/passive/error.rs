//! Passive-property error types

use thiserror::Error;

use crate::data::{TraceError, WindowError};
use crate::optimize::FitError;

/// Errors that can occur while estimating passive membrane properties
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PassiveError {
    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Window(#[from] WindowError),

    /// Both nominal step amplitudes are zero
    #[error("Both current_amplitude and voltage_step are zero; cannot compute resistance")]
    ZeroStep,

    /// Nominal step amplitude is zero for the selected clamp mode
    #[error("{param} is zero")]
    ZeroAmplitude { param: &'static str },

    /// A window selects no sample
    #[error("No data in {name} window [{start}, {end})")]
    EmptyWindow {
        name: &'static str,
        start: f64,
        end: f64,
    },

    /// Too few samples survive the window for the requested operation
    #[error("Insufficient data: {n} points, need at least {required}")]
    InsufficientSamples { n: usize, required: usize },

    /// Automatic pulse-edge detection failed
    #[error("Pulse detection failed: {reason}")]
    DetectionFailed { reason: String },

    /// Exponential fit failed
    #[error("Exponential fit failed: {0}")]
    Fit(#[from] FitError),

    /// Fit converged to non-finite parameters
    #[error("Exponential fit produced non-finite parameters")]
    NonFiniteFit,

    /// Denominator of a ratio is zero
    #[error("Cannot compute {quantity}: denominator is zero")]
    ZeroDenominator { quantity: &'static str },

    /// Windows that must be disjoint overlap
    #[error("Windows overlap: {first} and {second}")]
    OverlappingWindows {
        first: &'static str,
        second: &'static str,
    },

    /// Invalid parameter value
    #[error("Invalid parameter: {param} = {value}")]
    InvalidParameter { param: String, value: String },
}
