//! Resting membrane potential over a quiescent window

use super::calc;
use super::error::PassiveError;
use super::types::{RmpOptions, RmpResult};
use crate::data::Trace;

/// Mean, spread and linear drift of the membrane potential in `options.window`
pub fn calculate_rmp(trace: &Trace, options: &RmpOptions) -> Result<RmpResult, PassiveError> {
    let window = &options.window;
    let (values, times) = trace
        .slice_with_time(window)
        .ok_or(PassiveError::EmptyWindow {
            name: "rmp",
            start: window.start(),
            end: window.end(),
        })?;

    let rmp_mv = calc::mean(values.view()).unwrap_or(f64::NAN);
    let std_mv = calc::std_dev(values.view()).unwrap_or(f64::NAN);
    if !rmp_mv.is_finite() {
        return Err(PassiveError::InvalidParameter {
            param: "trace".to_string(),
            value: "non-finite samples in rmp window".to_string(),
        });
    }

    let drift_mv_per_s =
        calc::linear_regression(&times.to_vec(), &values.to_vec()).map(|(slope, _, _)| slope);

    Ok(RmpResult {
        rmp_mv,
        std_mv,
        drift_mv_per_s,
        n_samples: values.len(),
    })
}
