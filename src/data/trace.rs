//! Digitized recording sweep
//!
//! A [`Trace`] is the unit of analysis: one channel of samples (mV in current
//! clamp, pA in voltage clamp) paired 1:1 with a time vector in seconds.

use ndarray::{Array1, ArrayView1};

use super::error::TraceError;
use super::window::{slice_window, slice_window_with_time, Window};

/// A validated sweep: samples, time vector and sampling rate
///
/// Construction guarantees `data.len() == time.len()`, a finite non-decreasing
/// time vector and a finite positive sampling rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    data: Array1<f64>,
    time: Array1<f64>,
    sampling_rate: f64,
}

impl Trace {
    /// Create a trace from explicit samples and time points
    ///
    /// # Errors
    /// Returns [`TraceError`] if the vectors differ in length, the time vector
    /// decreases or contains non-finite values, or the sampling rate is not a
    /// finite positive number.
    pub fn new(
        data: impl Into<Array1<f64>>,
        time: impl Into<Array1<f64>>,
        sampling_rate: f64,
    ) -> Result<Self, TraceError> {
        let data = data.into();
        let time = time.into();

        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(TraceError::InvalidSamplingRate(sampling_rate));
        }
        if data.len() != time.len() {
            return Err(TraceError::LengthMismatch {
                data: data.len(),
                time: time.len(),
            });
        }
        for (index, t) in time.iter().enumerate() {
            if !t.is_finite() {
                return Err(TraceError::NonFiniteTime { index });
            }
            if index > 0 && *t < time[index - 1] {
                return Err(TraceError::DecreasingTime { index });
            }
        }

        Ok(Self {
            data,
            time,
            sampling_rate,
        })
    }

    /// Create a trace from samples alone, generating `time[i] = t0 + i / sampling_rate`
    pub fn from_sampling_rate(
        data: impl Into<Array1<f64>>,
        sampling_rate: f64,
        t0: f64,
    ) -> Result<Self, TraceError> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(TraceError::InvalidSamplingRate(sampling_rate));
        }
        let data = data.into();
        let time = Array1::from_iter((0..data.len()).map(|i| t0 + i as f64 / sampling_rate));
        Self::new(data, time, sampling_rate)
    }

    pub fn data(&self) -> ArrayView1<'_, f64> {
        self.data.view()
    }

    pub fn time(&self) -> ArrayView1<'_, f64> {
        self.time.view()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// First and last time point, if the trace has samples
    pub fn span(&self) -> Option<(f64, f64)> {
        Some((*self.time.first()?, *self.time.last()?))
    }

    /// Samples falling inside `window`, or `None` if it selects nothing
    pub fn slice(&self, window: &Window) -> Option<Array1<f64>> {
        slice_window(self.data.view(), self.time.view(), window)
    }

    /// Samples and their time points inside `window`, or `None` if it selects nothing
    pub fn slice_with_time(&self, window: &Window) -> Option<(Array1<f64>, Array1<f64>)> {
        slice_window_with_time(self.data.view(), self.time.view(), window)
    }

    /// Return a copy of this trace with `f` applied to every sample, in order
    pub fn map(&self, f: impl FnMut(f64) -> f64) -> Self {
        Self {
            data: self.data.mapv(f),
            time: self.time.clone(),
            sampling_rate: self.sampling_rate,
        }
    }
}
