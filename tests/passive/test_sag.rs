//! Tests for sag ratio and resting potential through the public API

use approx::assert_relative_eq;
use ephysol::prelude::*;
use ephysol::synthetic::StepProtocol;

fn window(start: f64, end: f64) -> Window {
    Window::new(start, end).unwrap()
}

#[test]
fn test_sag_grows_with_ih() {
    let options = SagOptions::new(window(0.0, 0.19), window(0.2, 0.39), window(0.4, 0.5));

    let ratios: Vec<f64> = [-1.0, -3.0, -6.0]
        .iter()
        .map(|&amplitude| {
            let trace = StepProtocol::default()
                .with_sag(amplitude, 0.03)
                .trace()
                .unwrap();
            trace.sag(&options).unwrap().sag_ratio
        })
        .collect();

    assert!(ratios[0] > 1.0);
    assert!(ratios[0] < ratios[1]);
    assert!(ratios[1] < ratios[2]);
}

#[test]
fn test_sag_zero_hyperpolarization() {
    let trace = StepProtocol {
        deflection: 0.0,
        ..Default::default()
    }
    .trace()
    .unwrap();
    let options = SagOptions::new(window(0.0, 0.19), window(0.2, 0.35), window(0.4, 0.5));

    assert!(trace.sag(&options).is_err());
}

#[test]
fn test_rmp_on_baseline() {
    let trace = StepProtocol::default().trace().unwrap();
    let rmp = trace.rmp(&RmpOptions::new(window(0.0, 0.15))).unwrap();

    assert_relative_eq!(rmp.rmp_mv, -65.0);
    assert_relative_eq!(rmp.std_mv, 0.0);
    assert_relative_eq!(rmp.drift_mv_per_s.unwrap(), 0.0, epsilon = 1e-9);
    assert_eq!(rmp.n_samples, 1500);
}
