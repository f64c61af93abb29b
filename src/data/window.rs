//! Half-open time windows and window slicing
//!
//! A [`Window`] selects the samples with `start <= time < end`. Slicing never
//! panics on an empty selection: it returns `None`, and callers surface that as
//! an invalid result.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::error::WindowError;

/// Half-open time interval `[start, end)` in seconds
///
/// Serialized as a `[start, end]` pair; deserialization re-runs validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct Window {
    start: f64,
    end: f64,
}

impl Window {
    /// Create a window, enforcing finite bounds with `start < end`
    pub fn new(start: f64, end: f64) -> Result<Self, WindowError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(WindowError::NonFinite { start, end });
        }
        if start >= end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    /// Whether the two half-open intervals share any time point
    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl TryFrom<(f64, f64)> for Window {
    type Error = WindowError;

    fn try_from((start, end): (f64, f64)) -> Result<Self, Self::Error> {
        Window::new(start, end)
    }
}

impl From<Window> for (f64, f64) {
    fn from(window: Window) -> Self {
        (window.start, window.end)
    }
}

/// Baseline and response windows of a step protocol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseWindows {
    /// Pre-stimulus reference period
    pub baseline: Window,
    /// Steady-state part of the response
    pub response: Window,
}

impl Default for PulseWindows {
    fn default() -> Self {
        Self {
            baseline: Window {
                start: 0.0,
                end: 0.1,
            },
            response: Window {
                start: 0.3,
                end: 0.4,
            },
        }
    }
}

/// Where baseline/response windows come from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WindowSource {
    /// Detect the step edges from the signal, using `fallback` if detection fails
    Auto { fallback: PulseWindows },
    /// Use the given windows as-is
    Manual(PulseWindows),
}

impl Default for WindowSource {
    fn default() -> Self {
        WindowSource::Auto {
            fallback: PulseWindows::default(),
        }
    }
}

/// Samples of `data` whose time lies in `window`
///
/// Returns `None` when the window selects no sample.
pub fn slice_window(
    data: ArrayView1<f64>,
    time: ArrayView1<f64>,
    window: &Window,
) -> Option<Array1<f64>> {
    let selected: Vec<f64> = data
        .iter()
        .zip(time.iter())
        .filter(|(_, &t)| window.contains(t))
        .map(|(&v, _)| v)
        .collect();

    if selected.is_empty() {
        None
    } else {
        Some(Array1::from(selected))
    }
}

/// Like [`slice_window`], also returning the matching time points
pub fn slice_window_with_time(
    data: ArrayView1<f64>,
    time: ArrayView1<f64>,
    window: &Window,
) -> Option<(Array1<f64>, Array1<f64>)> {
    let (values, times): (Vec<f64>, Vec<f64>) = data
        .iter()
        .zip(time.iter())
        .filter(|(_, &t)| window.contains(t))
        .map(|(&v, &t)| (v, t))
        .unzip();

    if values.is_empty() {
        None
    } else {
        Some((Array1::from(values), Array1::from(times)))
    }
}
