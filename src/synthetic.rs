//! Synthetic step-protocol recordings
//!
//! Generators for noiseless membrane responses with known passive properties,
//! plus seeded Gaussian noise. Used by the test suite, the benchmarks and for
//! checking analysis settings against ground truth.

use ndarray::Array1;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};
use serde::{Deserialize, Serialize};

use crate::data::{Trace, TraceError};

/// Ih-like sag: an extra deflection that relaxes with its own time constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SagComponent {
    /// Additional deflection at the peak, same sign as the step (mV)
    pub amplitude: f64,
    pub tau_s: f64,
}

/// RC response of a membrane to a rectangular step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepProtocol {
    pub sampling_rate: f64,
    pub duration_s: f64,
    pub onset_s: f64,
    pub offset_s: f64,
    /// Resting level (mV or pA)
    pub baseline: f64,
    /// Steady-state deflection during the step
    pub deflection: f64,
    /// Charging time constant
    pub tau_s: f64,
    pub sag: Option<SagComponent>,
}

impl Default for StepProtocol {
    fn default() -> Self {
        Self {
            sampling_rate: 10_000.0,
            duration_s: 0.8,
            onset_s: 0.2,
            offset_s: 0.5,
            baseline: -65.0,
            deflection: -10.0,
            tau_s: 0.02,
            sag: None,
        }
    }
}

impl StepProtocol {
    /// Steady-state deflection for a current step through `rin_mohm`
    ///
    /// `ΔV (mV) = I (pA) · Rin (MOhm) / 1000`
    pub fn current_step(current_pa: f64, rin_mohm: f64) -> Self {
        Self {
            deflection: current_pa * rin_mohm / 1000.0,
            ..Default::default()
        }
    }

    pub fn with_sag(mut self, amplitude: f64, tau_s: f64) -> Self {
        self.sag = Some(SagComponent { amplitude, tau_s });
        self
    }

    fn value_at(&self, t: f64) -> f64 {
        if t < self.onset_s {
            self.baseline
        } else if t < self.offset_s {
            self.during(t - self.onset_s)
        } else {
            let at_offset = self.during(self.offset_s - self.onset_s);
            self.baseline + (at_offset - self.baseline) * (-(t - self.offset_s) / self.tau_s).exp()
        }
    }

    fn during(&self, x: f64) -> f64 {
        let charge = 1.0 - (-x / self.tau_s).exp();
        let sag = self
            .sag
            .map(|s| s.amplitude * (-x / s.tau_s).exp())
            .unwrap_or(0.0);
        self.baseline + (self.deflection + sag) * charge
    }

    pub fn trace(&self) -> Result<Trace, TraceError> {
        sample(self.sampling_rate, self.duration_s, |t| self.value_at(t))
    }
}

/// Flat at `v_ss + Σ a_i` before `start_s`, then `v_ss + Σ a_i·exp(-(t - start)/τ_i)`
///
/// `components` are `(amplitude, tau_s)` pairs.
pub fn exponential_sum(
    sampling_rate: f64,
    duration_s: f64,
    start_s: f64,
    v_ss: f64,
    components: &[(f64, f64)],
) -> Result<Trace, TraceError> {
    sample(sampling_rate, duration_s, |t| {
        let x = (t - start_s).max(0.0);
        v_ss + components
            .iter()
            .map(|(amplitude, tau)| amplitude * (-x / tau).exp())
            .sum::<f64>()
    })
}

/// Single exponential relaxation from `v_0` to `v_ss` starting at `start_s`
pub fn exponential(
    sampling_rate: f64,
    duration_s: f64,
    start_s: f64,
    v_ss: f64,
    v_0: f64,
    tau_s: f64,
) -> Result<Trace, TraceError> {
    exponential_sum(sampling_rate, duration_s, start_s, v_ss, &[(v_0 - v_ss, tau_s)])
}

/// Copy of `trace` with zero-mean Gaussian noise of standard deviation `sd`
///
/// `sd` must be finite and non-negative.
pub fn with_noise(trace: &Trace, sd: f64, seed: u64) -> Result<Trace, NormalError> {
    if !sd.is_finite() || sd < 0.0 {
        return Err(NormalError::BadVariance);
    }
    let normal = Normal::new(0.0, sd)?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(trace.map(|v| v + normal.sample(&mut rng)))
}

fn sample(
    sampling_rate: f64,
    duration_s: f64,
    f: impl Fn(f64) -> f64,
) -> Result<Trace, TraceError> {
    if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
        return Err(TraceError::InvalidSamplingRate(sampling_rate));
    }
    let n = (duration_s * sampling_rate).round().max(0.0) as usize;
    let data = Array1::from_iter((0..n).map(|i| f(i as f64 / sampling_rate)));
    Trace::from_sampling_rate(data, sampling_rate, 0.0)
}
