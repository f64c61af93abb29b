//! Input resistance and conductance
//!
//! The same relationship R = V/I is measured from opposite sides depending on
//! the clamp mode: current clamp injects a known current and measures the
//! voltage deflection, voltage clamp imposes a known voltage step and measures
//! the current. Both return the same [`RinResult`] envelope and never panic on
//! bad input; failures come back as invalid results.

use serde_json::{Map, Value};

use super::calc;
use super::detect::detect_pulse;
use super::error::PassiveError;
use super::types::{ClampMode, RinOptions, RinResult, SignConvention};
use crate::data::{PulseWindows, Trace, WindowSource};

/// Estimate input resistance, choosing the clamp mode from the nominal amplitudes
///
/// A nonzero `current_amplitude_pa` selects current clamp, otherwise a
/// nonzero `voltage_step_mv` selects voltage clamp. With both zero the result
/// is invalid.
pub fn calculate_rin(trace: &Trace, options: &RinOptions) -> RinResult {
    let Some(mode) = options.clamp_mode() else {
        return RinResult::invalid(
            None,
            PassiveError::ZeroStep.to_string(),
            parameters(&[
                ("current_amplitude_pa", options.current_amplitude_pa),
                ("voltage_step_mv", options.voltage_step_mv),
            ]),
        );
    };

    let nominal = match mode {
        ClampMode::CurrentClamp => options.current_amplitude_pa,
        ClampMode::VoltageClamp => options.voltage_step_mv,
    };
    let (windows, auto_detected) = resolve_windows(trace, nominal, options);

    let mut result = match mode {
        ClampMode::CurrentClamp => rin_current_clamp(
            trace,
            options.current_amplitude_pa,
            &windows,
            options.sign,
        ),
        ClampMode::VoltageClamp => {
            conductance_voltage_clamp(trace, options.voltage_step_mv, &windows, options.sign)
        }
    };
    result.auto_detected = auto_detected;
    result
}

/// Windows to measure from, and whether they were detected
///
/// A failed detection falls back to the configured windows and is logged.
pub fn resolve_windows(trace: &Trace, nominal: f64, options: &RinOptions) -> (PulseWindows, bool) {
    match options.windows {
        WindowSource::Manual(windows) => (windows, false),
        WindowSource::Auto { fallback } => match detect_pulse(trace, nominal, &options.detect) {
            Ok(edges) => (edges.windows, true),
            Err(err) => {
                tracing::warn!(%err, "pulse auto-detection failed, using fallback windows");
                (fallback, false)
            }
        },
    }
}

/// Input resistance from a current-clamp voltage trace
///
/// `Rin = |ΔV| / (|I| / 1000)` in MOhm, where ΔV is the difference between the
/// response and baseline means (snapped to zero when the two are close). The
/// signed ΔV stays available as `voltage_deflection`. Conductance is reported
/// as `1000 / Rin`, or zero when Rin is zero.
pub fn rin_current_clamp(
    trace: &Trace,
    current_amplitude_pa: f64,
    windows: &PulseWindows,
    sign: SignConvention,
) -> RinResult {
    let mode = Some(ClampMode::CurrentClamp);
    let params = window_parameters("current_amplitude_pa", current_amplitude_pa, windows);

    if current_amplitude_pa == 0.0 {
        let err = PassiveError::ZeroAmplitude {
            param: "current_amplitude",
        };
        return RinResult::invalid(mode, err.to_string(), params);
    }

    let (baseline_voltage, steady_state_voltage) = match window_means(trace, windows) {
        Ok(means) => means,
        Err(err) => return RinResult::invalid(mode, err.to_string(), params),
    };

    let delta_v = if calc::is_close(steady_state_voltage, baseline_voltage) {
        0.0
    } else {
        steady_state_voltage - baseline_voltage
    };

    let rin = match sign {
        SignConvention::Mixed | SignConvention::Magnitude => {
            delta_v.abs() / (current_amplitude_pa.abs() / 1000.0)
        }
        SignConvention::Signed => delta_v / (current_amplitude_pa / 1000.0),
    };
    if !rin.is_finite() {
        return RinResult::invalid(mode, non_finite("input resistance"), params);
    }
    let conductance = if rin != 0.0 { 1000.0 / rin } else { 0.0 };

    RinResult {
        value: Some(rin),
        conductance: Some(conductance),
        voltage_deflection: Some(delta_v),
        current_injection: Some(current_amplitude_pa),
        baseline_voltage: Some(baseline_voltage),
        steady_state_voltage: Some(steady_state_voltage),
        windows: Some(*windows),
        ..RinResult::empty(mode, params)
    }
}

/// Conductance from a voltage-clamp current trace
///
/// `G = (ΔI / ΔV) / 1000` in µS with ΔI signed (unless
/// [`SignConvention::Magnitude`] is selected), and `Rin = 1 / G` in MOhm, which
/// is infinite for zero conductance.
pub fn conductance_voltage_clamp(
    trace: &Trace,
    voltage_step_mv: f64,
    windows: &PulseWindows,
    sign: SignConvention,
) -> RinResult {
    let mode = Some(ClampMode::VoltageClamp);
    let params = window_parameters("voltage_step_mv", voltage_step_mv, windows);

    if voltage_step_mv == 0.0 {
        let err = PassiveError::ZeroAmplitude {
            param: "voltage_step",
        };
        return RinResult::invalid(mode, err.to_string(), params);
    }

    let (baseline_current, steady_state_current) = match window_means(trace, windows) {
        Ok(means) => means,
        Err(err) => return RinResult::invalid(mode, err.to_string(), params),
    };

    let delta_i = steady_state_current - baseline_current;
    let conductance = match sign {
        SignConvention::Mixed | SignConvention::Signed => (delta_i / voltage_step_mv) / 1000.0,
        SignConvention::Magnitude => (delta_i.abs() / voltage_step_mv.abs()) / 1000.0,
    };
    if !conductance.is_finite() {
        return RinResult::invalid(mode, non_finite("conductance"), params);
    }
    let rin = if conductance != 0.0 {
        1.0 / conductance
    } else {
        f64::INFINITY
    };

    RinResult {
        value: Some(rin),
        conductance: Some(conductance),
        voltage_deflection: Some(voltage_step_mv),
        current_injection: Some(delta_i),
        baseline_current: Some(baseline_current),
        steady_state_current: Some(steady_state_current),
        windows: Some(*windows),
        ..RinResult::empty(mode, params)
    }
}

/// Mean of the baseline and response windows
fn window_means(trace: &Trace, windows: &PulseWindows) -> Result<(f64, f64), PassiveError> {
    let baseline = trace
        .slice(&windows.baseline)
        .ok_or(PassiveError::EmptyWindow {
            name: "baseline",
            start: windows.baseline.start(),
            end: windows.baseline.end(),
        })?;
    let response = trace
        .slice(&windows.response)
        .ok_or(PassiveError::EmptyWindow {
            name: "response",
            start: windows.response.start(),
            end: windows.response.end(),
        })?;

    // Both slices are non-empty here
    let baseline_mean = calc::mean(baseline.view()).unwrap_or(f64::NAN);
    let response_mean = calc::mean(response.view()).unwrap_or(f64::NAN);
    if !baseline_mean.is_finite() || !response_mean.is_finite() {
        return Err(PassiveError::InvalidParameter {
            param: "trace".to_string(),
            value: "non-finite samples in measurement windows".to_string(),
        });
    }
    Ok((baseline_mean, response_mean))
}

fn window_parameters(
    amplitude_key: &str,
    amplitude: f64,
    windows: &PulseWindows,
) -> Map<String, Value> {
    parameters(&[
        (amplitude_key, amplitude),
        ("baseline_start", windows.baseline.start()),
        ("baseline_end", windows.baseline.end()),
        ("response_start", windows.response.start()),
        ("response_end", windows.response.end()),
    ])
}

pub(crate) fn parameters(entries: &[(&str, f64)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), Value::from(*value)))
        .collect()
}

fn non_finite(quantity: &str) -> String {
    format!("Computed {} is not finite", quantity)
}
