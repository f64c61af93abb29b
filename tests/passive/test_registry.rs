//! Tests for the flat-record registry

use approx::assert_relative_eq;
use ephysol::prelude::*;
use ephysol::synthetic::{exponential, exponential_sum, StepProtocol};
use serde_json::{json, Value};

fn kwargs(value: Value) -> Kwargs {
    match value {
        Value::Object(map) => map,
        _ => panic!("kwargs must be an object"),
    }
}

fn run(registry: &Registry, name: &str, trace: &Trace, args: Value) -> Record {
    registry
        .run(
            name,
            trace.data().as_slice().unwrap(),
            trace.time().as_slice().unwrap(),
            trace.sampling_rate(),
            &kwargs(args),
        )
        .unwrap()
}

#[test]
fn test_rin_record_zero_amplitudes() {
    let registry = Registry::builtin();
    let trace = StepProtocol::default().trace().unwrap();
    let record = run(
        &registry,
        "rin_analysis",
        &trace,
        json!({ "current_amplitude": 0.0, "voltage_step": 0.0 }),
    );

    assert_eq!(record["rin_mohm"], Value::Null);
    assert!(!record["rin_error"].as_str().unwrap().is_empty());
}

#[test]
fn test_rin_record_flat_trace() {
    let registry = Registry::builtin();
    let trace = Trace::from_sampling_rate(vec![-65.0; 1000], 1000.0, 0.0).unwrap();
    let record = run(
        &registry,
        "rin_analysis",
        &trace,
        json!({ "current_amplitude": -50.0, "auto_detect_pulse": false }),
    );

    assert_eq!(record["voltage_deflection_mv"], json!(0.0));
    assert_eq!(record["rin_mohm"], json!(0.0));
    assert_eq!(record["auto_detected"], json!(false));
    assert_eq!(record["rin_error"], Value::Null);
}

#[test]
fn test_rin_record_auto_detect() {
    let registry = Registry::builtin();
    let trace = StepProtocol::current_step(-50.0, 200.0).trace().unwrap();
    let record = run(
        &registry,
        "rin_analysis",
        &trace,
        json!({ "current_amplitude": -50.0 }),
    );

    assert_eq!(record["auto_detected"], json!(true));
    assert_eq!(record["clamp_mode"], json!("current_clamp"));
    assert_relative_eq!(record["rin_mohm"].as_f64().unwrap(), 200.0, max_relative = 1e-3);
    assert_relative_eq!(record["baseline_voltage_mv"].as_f64().unwrap(), -65.0);
}

#[test]
fn test_voltage_clamp_infinite_rin_is_null() {
    let registry = Registry::builtin();
    let trace = Trace::from_sampling_rate(vec![-100.0; 1000], 1000.0, 0.0).unwrap();
    let record = run(
        &registry,
        "rin_analysis",
        &trace,
        json!({ "voltage_step": -10.0, "auto_detect_pulse": false }),
    );

    assert_eq!(record["clamp_mode"], json!("voltage_clamp"));
    assert_eq!(record["rin_mohm"], Value::Null);
    assert_eq!(record["conductance_us"].as_f64(), Some(0.0));
    assert_eq!(record["rin_error"], Value::Null);
}

#[test]
fn test_empty_window_record() {
    let registry = Registry::builtin();
    let trace = Trace::from_sampling_rate(vec![-65.0; 1000], 1000.0, 0.0).unwrap();
    let record = run(
        &registry,
        "rin_analysis",
        &trace,
        json!({
            "current_amplitude": -50.0,
            "auto_detect_pulse": false,
            "response_start": 5.0,
            "response_end": 6.0
        }),
    );

    assert_eq!(record["rin_mohm"], Value::Null);
    assert!(record["rin_error"].is_string());
}

#[test]
fn test_tau_records() {
    let registry = Registry::builtin();

    let mono = exponential(10_000.0, 0.3, 0.1, -70.0, -60.0, 0.02).unwrap();
    let record = run(
        &registry,
        "tau_analysis",
        &mono,
        json!({ "stim_start_time": 0.1, "fit_duration": 0.1 }),
    );
    assert_eq!(record["tau_model"], json!("mono"));
    assert_relative_eq!(record["tau_ms"].as_f64().unwrap(), 20.0, max_relative = 0.05);
    assert!(record["tau_r_squared"].as_f64().unwrap() > 0.99);
    assert_eq!(record["parameters"]["fit_duration"], json!(0.1));

    let bi = exponential_sum(10_000.0, 0.4, 0.1, -70.0, &[(6.0, 0.005), (4.0, 0.05)]).unwrap();
    let record = run(
        &registry,
        "tau_analysis",
        &bi,
        json!({ "stim_start_time": 0.1, "fit_duration": 0.25, "tau_model": "bi" }),
    );
    let fast = record["tau_fast_ms"].as_f64().unwrap();
    let slow = record["tau_slow_ms"].as_f64().unwrap();
    assert!(fast <= slow);
    assert_relative_eq!(fast, 5.0, max_relative = 0.1);
    assert_relative_eq!(slow, 50.0, max_relative = 0.1);
}

#[test]
fn test_tau_failure_record() {
    let registry = Registry::builtin();
    let trace = exponential(10_000.0, 0.3, 0.1, -70.0, -60.0, 0.02).unwrap();
    let record = run(
        &registry,
        "tau_analysis",
        &trace,
        json!({ "stim_start_time": 2.0 }),
    );

    assert_eq!(record["tau_ms"], Value::Null);
    assert!(record["tau_error"].as_str().unwrap().contains("fit"));
}

#[test]
fn test_bad_kwargs_type() {
    let registry = Registry::builtin();
    let trace = StepProtocol::default().trace().unwrap();
    let record = run(
        &registry,
        "tau_analysis",
        &trace,
        json!({ "fit_duration": "long" }),
    );

    assert_eq!(record["tau_ms"], Value::Null);
    assert!(record["tau_error"].as_str().unwrap().contains("kwargs"));
}

#[test]
fn test_sag_record_zero_hyperpolarization() {
    let registry = Registry::builtin();
    let trace = Trace::from_sampling_rate(vec![-65.0; 1000], 1000.0, 0.0).unwrap();
    let record = run(&registry, "sag_ratio_analysis", &trace, json!({}));

    assert_eq!(record["sag_ratio"], Value::Null);
    assert!(record["sag_error"].is_string());
}

#[test]
fn test_passive_properties_record() {
    let registry = Registry::builtin();
    let trace = StepProtocol::current_step(-50.0, 200.0).trace().unwrap();
    let record = run(
        &registry,
        "passive_properties",
        &trace,
        json!({
            "current_amplitude": -50.0,
            "stim_start_time": 0.2,
            "fit_duration": 0.15
        }),
    );

    assert_relative_eq!(record["rin_mohm"].as_f64().unwrap(), 200.0, max_relative = 1e-3);
    assert_relative_eq!(record["tau_ms"].as_f64().unwrap(), 20.0, max_relative = 0.02);
    assert_relative_eq!(record["cm_pf"].as_f64().unwrap(), 100.0, max_relative = 0.03);
    assert_eq!(record["cm_error"], Value::Null);
    assert!(record["tau_parameters"].is_object());
}

#[test]
fn test_run_batch_keeps_order() {
    let registry = Registry::builtin();
    let traces: Vec<Trace> = [100.0, 200.0, 300.0]
        .iter()
        .map(|&rin| StepProtocol::current_step(-50.0, rin).trace().unwrap())
        .collect();
    let records = registry
        .run_batch(
            "rin_analysis",
            &traces,
            &kwargs(json!({ "current_amplitude": -50.0 })),
            false,
        )
        .unwrap();

    let values: Vec<f64> = records
        .iter()
        .map(|r| r["rin_mohm"].as_f64().unwrap())
        .collect();
    assert_relative_eq!(values[0], 100.0, max_relative = 1e-3);
    assert_relative_eq!(values[1], 200.0, max_relative = 1e-3);
    assert_relative_eq!(values[2], 300.0, max_relative = 1e-3);
}

#[test]
fn test_records_are_idempotent() {
    let registry = Registry::builtin();
    let trace = StepProtocol::current_step(-50.0, 200.0).trace().unwrap();
    let args = json!({ "current_amplitude": -50.0, "stim_start_time": 0.2 });

    for name in registry.names() {
        let first = run(&registry, name, &trace, args.clone());
        let second = run(&registry, name, &trace, args.clone());
        assert_eq!(first, second, "{} is not deterministic", name);
    }
}
