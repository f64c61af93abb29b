//! Tests for the membrane time constant through the public API

use approx::assert_relative_eq;
use ephysol::prelude::*;
use ephysol::synthetic::{exponential, with_noise, StepProtocol};

#[test]
fn test_tau_from_step_onset() {
    // Charging curve of a 20 ms membrane, fitted from the step onset
    let trace = StepProtocol::default().trace().unwrap();
    let tau = trace
        .tau(&TauOptions::default().with_fit_window(0.2, 0.15))
        .unwrap();

    assert_relative_eq!(tau.membrane_tau_ms(), 20.0, max_relative = 0.02);
    assert!(tau.r_squared() > 0.999);
}

#[test]
fn test_tau_with_noise() {
    let clean = exponential(20_000.0, 0.3, 0.1, -70.0, -60.0, 0.02).unwrap();
    let trace = with_noise(&clean, 0.1, 7).unwrap();
    let tau = trace
        .tau(&TauOptions::default().with_fit_window(0.1, 0.1))
        .unwrap();

    assert_relative_eq!(tau.membrane_tau_ms(), 20.0, max_relative = 0.05);
    assert_relative_eq!(tau.rmse_mv(), 0.1, max_relative = 0.2);
}

#[test]
fn test_tau_and_capacitance() {
    let trace = StepProtocol::current_step(-50.0, 200.0).trace().unwrap();
    let rin = trace.input_resistance(&RinOptions::current_clamp(-50.0));
    let tau = trace
        .tau(&TauOptions::default().with_fit_window(0.2, 0.15))
        .unwrap();

    let cm = calculate_capacitance(tau.membrane_tau_ms(), rin.value().unwrap()).unwrap();
    // 20 ms / 200 MOhm = 100 pF
    assert_relative_eq!(cm, 100.0, max_relative = 0.02);
}

#[test]
fn test_tau_iteration_cap() {
    let trace = exponential(10_000.0, 0.3, 0.1, -70.0, -60.0, 0.02).unwrap();
    let options = TauOptions::default()
        .with_fit_window(0.1, 0.1)
        .with_max_evals(2);

    assert!(matches!(
        trace.tau(&options),
        Err(ephysol::PassiveError::Fit(_))
    ));
}
