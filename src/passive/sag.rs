//! Hyperpolarization sag
//!
//! `sag = (V_peak - V_baseline) / (V_ss - V_baseline)`, where the peak is the
//! most hyperpolarized level reached in the peak window. With enough samples
//! the 1st percentile stands in for the raw minimum so a single noisy sample
//! cannot set the peak.

use super::calc;
use super::error::PassiveError;
use super::types::{SagOptions, SagResult};
use crate::data::{Trace, Window};

pub fn calculate_sag_ratio(
    trace: &Trace,
    options: &SagOptions,
) -> Result<SagResult, PassiveError> {
    let named = [
        ("baseline", &options.baseline),
        ("peak", &options.peak),
        ("steady_state", &options.steady_state),
    ];
    for (i, &(first, a)) in named.iter().enumerate() {
        for &(second, b) in named.iter().skip(i + 1) {
            if a.overlaps(b) {
                return Err(PassiveError::OverlappingWindows { first, second });
            }
        }
    }

    let baseline = slice(trace, "baseline", &options.baseline)?;
    let peak = slice(trace, "peak", &options.peak)?;
    let steady_state = slice(trace, "steady_state", &options.steady_state)?;

    let v_baseline = calc::mean(baseline.view()).unwrap_or(f64::NAN);
    let v_steady_state = calc::mean(steady_state.view()).unwrap_or(f64::NAN);
    let robust_peak = if peak.len() > options.percentile_min_samples {
        calc::percentile(peak.view(), options.peak_percentile)
    } else {
        calc::argmin(peak.view()).map(|i| peak[i])
    };
    let v_peak = robust_peak.unwrap_or(f64::NAN);

    if ![v_baseline, v_peak, v_steady_state].iter().all(|v| v.is_finite()) {
        return Err(PassiveError::InvalidParameter {
            param: "trace".to_string(),
            value: "non-finite samples in sag windows".to_string(),
        });
    }

    if calc::is_close(v_steady_state, v_baseline) {
        return Err(PassiveError::ZeroDenominator {
            quantity: "sag ratio",
        });
    }
    let sag_ratio = (v_peak - v_baseline) / (v_steady_state - v_baseline);

    let peak_deflection = v_peak - v_baseline;
    let sag_percent = if peak_deflection != 0.0 {
        Some(100.0 * (v_peak - v_steady_state) / peak_deflection)
    } else {
        None
    };

    Ok(SagResult {
        sag_ratio,
        sag_percent,
        v_baseline,
        v_peak,
        v_steady_state,
    })
}

fn slice(
    trace: &Trace,
    name: &'static str,
    window: &Window,
) -> Result<ndarray::Array1<f64>, PassiveError> {
    trace.slice(window).ok_or(PassiveError::EmptyWindow {
        name,
        start: window.start(),
        end: window.end(),
    })
}
