//! Step-edge detection from the measured signal alone
//!
//! The onset and offset of a single monophasic step are taken as the extrema
//! of the first difference of a ~1 ms moving average. The expected polarity
//! comes from the sign of the nominal step amplitude: a negative step starts
//! at the most negative slope and ends at the most positive slope after it.
//!
//! No plausibility check is applied unless [`DetectOptions::min_plateau_s`]
//! is set; multi-step protocols and slow ramps can fool the heuristic.

use ndarray::s;
use serde::{Deserialize, Serialize};

use super::calc;
use super::error::PassiveError;
use super::types::DetectOptions;
use crate::data::{PulseWindows, Trace, Window};

/// Detected step edges and the windows derived from them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseEdges {
    pub onset_index: usize,
    pub offset_index: usize,
    pub onset_s: f64,
    pub offset_s: f64,
    pub windows: PulseWindows,
}

/// Locate the stimulus step in `trace` and derive baseline/response windows
///
/// The baseline window is `[onset - gap - span, onset - gap)` clipped to the
/// start of the trace; the response window is `[offset - gap - span, offset - gap)`
/// clipped to the onset.
pub fn detect_pulse(
    trace: &Trace,
    nominal_amplitude: f64,
    options: &DetectOptions,
) -> Result<PulseEdges, PassiveError> {
    if nominal_amplitude == 0.0 || !nominal_amplitude.is_finite() {
        return Err(PassiveError::DetectionFailed {
            reason: format!(
                "step polarity undefined for amplitude {}",
                nominal_amplitude
            ),
        });
    }
    let n = trace.len();
    if n < 3 {
        return Err(PassiveError::InsufficientSamples { n, required: 3 });
    }

    let width = (options.smoothing_s * trace.sampling_rate())
        .round()
        .max(0.0) as usize;
    let smoothed = calc::moving_average(trace.data(), width);
    let slope = calc::diff(smoothed.view());

    let (onset_index, offset_index) = if nominal_amplitude < 0.0 {
        let onset = calc::argmin(slope.view()).ok_or_else(|| no_edge("onset"))?;
        let offset = after(onset, slope.len(), |from| {
            calc::argmax(slope.slice(s![from..]))
        })?;
        (onset, offset)
    } else {
        let onset = calc::argmax(slope.view()).ok_or_else(|| no_edge("onset"))?;
        let offset = after(onset, slope.len(), |from| {
            calc::argmin(slope.slice(s![from..]))
        })?;
        (onset, offset)
    };

    let time = trace.time();
    let onset_s = time[onset_index];
    let offset_s = time[offset_index];

    if let Some(min_plateau) = options.min_plateau_s {
        if offset_s - onset_s < min_plateau {
            return Err(PassiveError::DetectionFailed {
                reason: format!(
                    "plateau of {:.4} s is shorter than the required {:.4} s",
                    offset_s - onset_s,
                    min_plateau
                ),
            });
        }
    }

    let lead = options.edge_gap_s + options.baseline_span_s;
    let baseline = Window::new(
        (onset_s - lead).max(time[0]),
        onset_s - options.edge_gap_s,
    )
    .map_err(|e| PassiveError::DetectionFailed {
        reason: format!("baseline window: {}", e),
    })?;
    let response = Window::new((offset_s - lead).max(onset_s), offset_s - options.edge_gap_s)
        .map_err(|e| PassiveError::DetectionFailed {
            reason: format!("response window: {}", e),
        })?;

    tracing::debug!(onset_s, offset_s, "detected pulse edges");

    Ok(PulseEdges {
        onset_index,
        offset_index,
        onset_s,
        offset_s,
        windows: PulseWindows { baseline, response },
    })
}

/// Search the slope strictly after `onset` and translate back to absolute indices
fn after(
    onset: usize,
    len: usize,
    search: impl Fn(usize) -> Option<usize>,
) -> Result<usize, PassiveError> {
    let from = onset + 1;
    if from >= len {
        return Err(no_edge("offset"));
    }
    search(from)
        .map(|rel| from + rel)
        .ok_or_else(|| no_edge("offset"))
}

fn no_edge(which: &str) -> PassiveError {
    PassiveError::DetectionFailed {
        reason: format!("no {} edge found", which),
    }
}
