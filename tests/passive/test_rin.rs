//! Tests for input resistance through the public API

use approx::assert_relative_eq;
use ephysol::prelude::*;
use ephysol::synthetic::{with_noise, StepProtocol};

fn step(current_pa: f64, rin_mohm: f64) -> Trace {
    StepProtocol::current_step(current_pa, rin_mohm).trace().unwrap()
}

#[test]
fn test_auto_detected_current_clamp() {
    let trace = step(-50.0, 150.0);
    let rin = trace.input_resistance(&RinOptions::current_clamp(-50.0));

    assert!(rin.is_valid());
    assert!(rin.auto_detected());
    assert_relative_eq!(rin.value().unwrap(), 150.0, max_relative = 1e-3);
    assert_relative_eq!(rin.voltage_deflection().unwrap(), -7.5, max_relative = 1e-3);
}

#[test]
fn test_auto_detection_with_noise() {
    // fast charging keeps the edges well above the smoothed noise
    let clean = StepProtocol {
        tau_s: 0.002,
        ..StepProtocol::current_step(-50.0, 200.0)
    }
    .trace()
    .unwrap();
    let trace = with_noise(&clean, 0.2, 42).unwrap();
    let rin = trace.input_resistance(&RinOptions::current_clamp(-50.0));

    assert!(rin.is_valid());
    let windows = rin.windows().unwrap();
    assert!(windows.baseline.end() < 0.2);
    assert!(windows.response.end() < 0.5);
    assert_relative_eq!(rin.value().unwrap(), 200.0, max_relative = 0.02);
}

#[test]
fn test_depolarizing_step() {
    let trace = step(100.0, 120.0);
    let rin = trace.input_resistance(&RinOptions::current_clamp(100.0));

    assert!(rin.is_valid());
    assert_relative_eq!(rin.value().unwrap(), 120.0, max_relative = 1e-3);
    assert!(rin.voltage_deflection().unwrap() > 0.0);
}

#[test]
fn test_manual_windows_skip_detection() {
    let trace = step(-50.0, 200.0);
    let options = RinOptions::current_clamp(-50.0).with_windows(
        Window::new(0.0, 0.15).unwrap(),
        Window::new(0.4, 0.48).unwrap(),
    );
    let rin = trace.input_resistance(&options);

    assert!(!rin.auto_detected());
    assert_eq!(
        rin.windows().unwrap().baseline,
        Window::new(0.0, 0.15).unwrap()
    );
    assert_eq!(rin.parameters()["baseline_end"], 0.15);
}

#[test]
fn test_invalid_result_display() {
    let trace = step(-50.0, 200.0);
    let rin = trace.input_resistance(&RinOptions::default());

    assert!(!rin.is_valid());
    assert!(rin.to_string().contains("zero"));
}

#[test]
fn test_batch_matches_single() {
    let traces: Vec<Trace> = (1..=8).map(|i| step(-50.0, 50.0 * i as f64)).collect();
    let options = RinOptions::current_clamp(-50.0);

    let batch = traces.input_resistance_all(&options);
    let single: Vec<RinResult> = traces.iter().map(|t| t.input_resistance(&options)).collect();
    assert_eq!(batch, single);
}
