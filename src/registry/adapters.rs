//! Flat-record adapters around the passive estimators
//!
//! Every adapter has the [`AnalysisFn`](super::AnalysisFn) shape and never
//! fails: problems end up under the analysis's `*_error` key with the primary
//! value set to `null`. Non-finite numbers are written as `null` as well.
//!
//! A record always holds exactly the `columns` of its [`AnalysisMeta`];
//! values that do not apply to a run are `null`.

use serde_json::{Map, Value};

use super::kwargs::{parse, RinKwargs, RmpKwargs, SagKwargs, TauKwargs};
use super::{AnalysisMeta, Kwargs, Record};
use crate::data::Trace;
use crate::passive::{
    calculate_capacitance, calculate_rin, calculate_rmp, calculate_sag_ratio, calculate_tau,
    PassiveError, RinResult, TauOptions, TauResult,
};

pub const RIN_ANALYSIS: AnalysisMeta = AnalysisMeta {
    name: "rin_analysis",
    label: "Input Resistance",
    description: "Input resistance (current clamp) or conductance (voltage clamp) from a step",
    options: &[
        "current_amplitude",
        "voltage_step",
        "auto_detect_pulse",
        "baseline_start",
        "baseline_end",
        "response_start",
        "response_end",
        "sign_convention",
        "min_plateau",
    ],
    error_key: "rin_error",
    primary_keys: &["rin_mohm", "conductance_us"],
    columns: &[
        "rin_mohm",
        "conductance_us",
        "voltage_deflection_mv",
        "current_injection_pa",
        "baseline_voltage_mv",
        "steady_state_voltage_mv",
        "baseline_current_pa",
        "steady_state_current_pa",
        "auto_detected",
        "clamp_mode",
        "parameters",
        "rin_error",
    ],
};

pub const TAU_ANALYSIS: AnalysisMeta = AnalysisMeta {
    name: "tau_analysis",
    label: "Membrane Time Constant",
    description: "Mono- or bi-exponential fit of the membrane charging curve",
    options: &[
        "stim_start_time",
        "fit_duration",
        "tau_model",
        "tau_bound_min",
        "tau_bound_max",
        "max_evals",
    ],
    error_key: "tau_error",
    primary_keys: &["tau_ms", "tau_fast_ms", "tau_slow_ms"],
    columns: &[
        "tau_model",
        "tau_ms",
        "v_0_mv",
        "tau_fast_ms",
        "tau_slow_ms",
        "amplitude_fast",
        "amplitude_slow",
        "v_ss_mv",
        "tau_r_squared",
        "tau_rmse_mv",
        "parameters",
        "tau_error",
    ],
};

pub const SAG_RATIO_ANALYSIS: AnalysisMeta = AnalysisMeta {
    name: "sag_ratio_analysis",
    label: "Sag Ratio",
    description: "Peak to steady-state ratio of a hyperpolarizing response",
    options: &[
        "baseline_start",
        "baseline_end",
        "peak_start",
        "peak_end",
        "steady_state_start",
        "steady_state_end",
        "peak_percentile",
    ],
    error_key: "sag_error",
    primary_keys: &["sag_ratio"],
    columns: &[
        "sag_ratio",
        "sag_percent",
        "sag_baseline_mv",
        "sag_peak_mv",
        "sag_steady_state_mv",
        "sag_error",
    ],
};

pub const RMP_ANALYSIS: AnalysisMeta = AnalysisMeta {
    name: "rmp_analysis",
    label: "Resting Membrane Potential",
    description: "Mean, spread and drift of the membrane potential over a quiet window",
    options: &["baseline_start", "baseline_end"],
    error_key: "rmp_error",
    primary_keys: &["rmp_mv"],
    columns: &[
        "rmp_mv",
        "rmp_std_mv",
        "rmp_drift_mv_per_s",
        "rmp_n_samples",
        "rmp_error",
    ],
};

pub const PASSIVE_PROPERTIES: AnalysisMeta = AnalysisMeta {
    name: "passive_properties",
    label: "Passive Properties",
    description: "Input resistance, time constant and capacitance in one record",
    options: &[
        "current_amplitude",
        "voltage_step",
        "auto_detect_pulse",
        "baseline_start",
        "baseline_end",
        "response_start",
        "response_end",
        "sign_convention",
        "min_plateau",
        "stim_start_time",
        "fit_duration",
        "tau_model",
        "tau_bound_min",
        "tau_bound_max",
        "max_evals",
    ],
    error_key: "cm_error",
    primary_keys: &["rin_mohm", "tau_ms", "tau_slow_ms", "cm_pf"],
    columns: &[
        "rin_mohm",
        "conductance_us",
        "voltage_deflection_mv",
        "current_injection_pa",
        "baseline_voltage_mv",
        "steady_state_voltage_mv",
        "baseline_current_pa",
        "steady_state_current_pa",
        "auto_detected",
        "clamp_mode",
        "parameters",
        "rin_error",
        "tau_model",
        "tau_ms",
        "v_0_mv",
        "tau_fast_ms",
        "tau_slow_ms",
        "amplitude_fast",
        "amplitude_slow",
        "v_ss_mv",
        "tau_r_squared",
        "tau_rmse_mv",
        "tau_parameters",
        "tau_error",
        "cm_pf",
        "cm_error",
    ],
};

// ============================================================================
// Adapters
// ============================================================================

pub fn run_rin_analysis(trace: &Trace, kwargs: &Kwargs) -> Record {
    match parse::<RinKwargs>(kwargs).and_then(RinKwargs::into_options) {
        Ok(options) => {
            let mut record = blank_record(&RIN_ANALYSIS);
            fill_rin(&mut record, &calculate_rin(trace, &options));
            record
        }
        Err(err) => failure_record(&RIN_ANALYSIS, &err.to_string()),
    }
}

pub fn run_tau_analysis(trace: &Trace, kwargs: &Kwargs) -> Record {
    match parse::<TauKwargs>(kwargs) {
        Ok(kwargs) => {
            let options = TauOptions::from(kwargs);
            let mut record = blank_record(&TAU_ANALYSIS);
            fill_tau(&mut record, &calculate_tau(trace, &options), &options, "parameters");
            record
        }
        Err(err) => failure_record(&TAU_ANALYSIS, &err.to_string()),
    }
}

pub fn run_sag_ratio_analysis(trace: &Trace, kwargs: &Kwargs) -> Record {
    let result = parse::<SagKwargs>(kwargs)
        .and_then(SagKwargs::into_options)
        .and_then(|options| calculate_sag_ratio(trace, &options));

    match result {
        Ok(sag) => {
            let mut record = blank_record(&SAG_RATIO_ANALYSIS);
            record.insert("sag_ratio".into(), Value::from(sag.sag_ratio));
            record.insert("sag_percent".into(), Value::from(sag.sag_percent));
            record.insert("sag_baseline_mv".into(), Value::from(sag.v_baseline));
            record.insert("sag_peak_mv".into(), Value::from(sag.v_peak));
            record.insert("sag_steady_state_mv".into(), Value::from(sag.v_steady_state));
            record
        }
        Err(err) => failure_record(&SAG_RATIO_ANALYSIS, &err.to_string()),
    }
}

pub fn run_rmp_analysis(trace: &Trace, kwargs: &Kwargs) -> Record {
    let result = parse::<RmpKwargs>(kwargs)
        .and_then(RmpKwargs::into_options)
        .and_then(|options| calculate_rmp(trace, &options));

    match result {
        Ok(rmp) => {
            let mut record = blank_record(&RMP_ANALYSIS);
            record.insert("rmp_mv".into(), Value::from(rmp.rmp_mv));
            record.insert("rmp_std_mv".into(), Value::from(rmp.std_mv));
            record.insert("rmp_drift_mv_per_s".into(), Value::from(rmp.drift_mv_per_s));
            record.insert("rmp_n_samples".into(), Value::from(rmp.n_samples));
            record
        }
        Err(err) => failure_record(&RMP_ANALYSIS, &err.to_string()),
    }
}

/// Rin, τ and Cm; bi-exponential fits use τ_slow for the capacitance
pub fn run_passive_properties(trace: &Trace, kwargs: &Kwargs) -> Record {
    let options = parse::<RinKwargs>(kwargs)
        .and_then(RinKwargs::into_options)
        .and_then(|rin| Ok((rin, TauOptions::from(parse::<TauKwargs>(kwargs)?))));
    let (rin_options, tau_options) = match options {
        Ok(options) => options,
        Err(err) => return failure_record(&PASSIVE_PROPERTIES, &err.to_string()),
    };

    let rin = calculate_rin(trace, &rin_options);
    let tau = calculate_tau(trace, &tau_options);

    let mut record = blank_record(&PASSIVE_PROPERTIES);
    fill_rin(&mut record, &rin);
    fill_tau(&mut record, &tau, &tau_options, "tau_parameters");

    let capacitance = match (rin.value(), &tau) {
        (None, _) => Err("input resistance unavailable".to_string()),
        (_, Err(_)) => Err("membrane time constant unavailable".to_string()),
        (Some(rin_mohm), Ok(tau)) => {
            calculate_capacitance(tau.membrane_tau_ms(), rin_mohm).map_err(|e| e.to_string())
        }
    };
    match capacitance {
        Ok(cm_pf) => {
            record.insert("cm_pf".into(), Value::from(cm_pf));
        }
        Err(message) => {
            record.insert("cm_error".into(), Value::from(message));
        }
    }
    record
}

// ============================================================================
// Record builders
// ============================================================================

/// Every column of `meta` set to `null`
fn blank_record(meta: &AnalysisMeta) -> Record {
    meta.columns
        .iter()
        .map(|key| ((*key).to_string(), Value::Null))
        .collect()
}

fn fill_rin(record: &mut Record, result: &RinResult) {
    let values = [
        ("rin_mohm", result.value()),
        ("conductance_us", result.conductance()),
        ("voltage_deflection_mv", result.voltage_deflection()),
        ("current_injection_pa", result.current_injection()),
        ("baseline_voltage_mv", result.baseline_voltage()),
        ("steady_state_voltage_mv", result.steady_state_voltage()),
        ("baseline_current_pa", result.baseline_current()),
        ("steady_state_current_pa", result.steady_state_current()),
    ];
    for (key, value) in values {
        record.insert(key.into(), Value::from(value));
    }
    record.insert("auto_detected".into(), Value::from(result.auto_detected()));
    record.insert(
        "clamp_mode".into(),
        Value::from(result.mode().map(|mode| mode.to_string())),
    );
    record.insert(
        "parameters".into(),
        Value::Object(result.parameters().clone()),
    );
    record.insert(
        "rin_error".into(),
        Value::from(result.error_message().map(str::to_string)),
    );
}

fn fill_tau(
    record: &mut Record,
    result: &Result<TauResult, PassiveError>,
    options: &TauOptions,
    parameters_key: &str,
) {
    record.insert("tau_model".into(), Value::from(options.model.to_string()));
    match result {
        Ok(TauResult::Mono(fit)) => {
            record.insert("tau_ms".into(), Value::from(fit.tau_ms));
            record.insert("v_ss_mv".into(), Value::from(fit.v_ss));
            record.insert("v_0_mv".into(), Value::from(fit.v_0));
        }
        Ok(TauResult::Bi(fit)) => {
            record.insert("tau_fast_ms".into(), Value::from(fit.tau_fast_ms));
            record.insert("tau_slow_ms".into(), Value::from(fit.tau_slow_ms));
            record.insert("amplitude_fast".into(), Value::from(fit.amplitude_fast));
            record.insert("amplitude_slow".into(), Value::from(fit.amplitude_slow));
            record.insert("v_ss_mv".into(), Value::from(fit.v_ss));
        }
        Err(_) => {}
    }
    match result {
        Ok(tau) => {
            record.insert("tau_r_squared".into(), Value::from(tau.r_squared()));
            record.insert("tau_rmse_mv".into(), Value::from(tau.rmse_mv()));
        }
        Err(err) => {
            record.insert("tau_error".into(), Value::from(err.to_string()));
        }
    }
    record.insert(
        parameters_key.into(),
        Value::Object(tau_parameters(options)),
    );
}

fn tau_parameters(options: &TauOptions) -> Map<String, Value> {
    let mut parameters = Map::new();
    parameters.insert("stim_start_time".into(), Value::from(options.stim_start_s));
    parameters.insert("fit_duration".into(), Value::from(options.fit_duration_s));
    parameters.insert("tau_model".into(), Value::from(options.model.to_string()));
    parameters.insert("tau_bound_min".into(), Value::from(options.tau_bounds_s.0));
    parameters.insert("tau_bound_max".into(), Value::from(options.tau_bounds_s.1));
    parameters.insert("max_evals".into(), Value::from(options.max_evals()));
    parameters
}

/// Record of a run that produced nothing: every column `null` except the
/// `*_error` columns, which carry `message`
pub(crate) fn failure_record(meta: &AnalysisMeta, message: &str) -> Record {
    let message = if message.is_empty() {
        "Unknown error"
    } else {
        message
    };
    let mut record = blank_record(meta);
    for key in meta.columns.iter().filter(|key| key.ends_with("_error")) {
        record.insert((*key).to_string(), Value::from(message));
    }
    record.insert(meta.error_key.to_string(), Value::from(message));
    record
}
