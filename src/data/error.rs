//! Error types for trace and window construction
//!
//! [`TraceError`] and [`WindowError`] describe problems with the input data
//! itself, independent of any analysis. Analysis code propagates them via the
//! [`From`] impls on [`PassiveError`](crate::passive::PassiveError).

use thiserror::Error;

/// Errors arising from trace validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    /// Samples and time vector differ in length
    #[error("Array length mismatch: data has {data} samples, time has {time}")]
    LengthMismatch {
        /// Number of samples in the data vector
        data: usize,
        /// Number of entries in the time vector
        time: usize,
    },

    /// Time values decrease somewhere in the vector
    #[error("Invalid time sequence: time decreases at index {index}")]
    DecreasingTime {
        /// First index where `time[index] < time[index - 1]`
        index: usize,
    },

    /// Time or sample value is NaN or infinite
    #[error("Non-finite time value at index {index}")]
    NonFiniteTime {
        /// Offending index
        index: usize,
    },

    /// Sampling rate is zero, negative or non-finite
    #[error("Invalid sampling rate: {0} Hz")]
    InvalidSamplingRate(f64),
}

/// Errors arising from window construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    /// One of the bounds is NaN or infinite
    #[error("Window bounds must be finite (start={start}, end={end})")]
    NonFinite { start: f64, end: f64 },

    /// The window has zero or negative width
    #[error("Window start ({start}) must be before end ({end})")]
    Inverted { start: f64, end: f64 },
}
