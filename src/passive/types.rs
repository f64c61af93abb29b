//! Passive-property types: options and results
//!
//! This module defines all public types for passive-property analysis:
//! - [`RinOptions`] / [`RinResult`]: input resistance and conductance
//! - [`TauOptions`] / [`TauResult`]: membrane time constant(s)
//! - [`SagOptions`] / [`SagResult`]: hyperpolarization sag
//! - [`RmpOptions`] / [`RmpResult`]: resting membrane potential

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::data::{PulseWindows, Window, WindowError, WindowSource};

// ============================================================================
// Configuration Types
// ============================================================================

/// Recording configuration that decides which side of R = V/I is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampMode {
    /// Current step injected, voltage measured
    CurrentClamp,
    /// Voltage step imposed, current measured
    VoltageClamp,
}

impl fmt::Display for ClampMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClampMode::CurrentClamp => write!(f, "current_clamp"),
            ClampMode::VoltageClamp => write!(f, "voltage_clamp"),
        }
    }
}

/// Sign handling of the resistance estimators
///
/// `Mixed` reports current-clamp resistance as a magnitude while keeping the
/// voltage-clamp conductance signed. The other two make both paths agree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignConvention {
    #[default]
    Mixed,
    /// Both paths report magnitudes
    Magnitude,
    /// Both paths keep the sign of the measured deflection
    Signed,
}

/// Pulse-edge detection settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectOptions {
    /// Width of the centered moving average, in seconds (default: 1 ms)
    pub smoothing_s: f64,
    /// Length of the baseline and response windows (default: 100 ms)
    pub baseline_span_s: f64,
    /// Gap between a window and the edge it precedes (default: 5 ms)
    pub edge_gap_s: f64,
    /// Reject detections whose onset→offset duration is shorter (default: off)
    pub min_plateau_s: Option<f64>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            smoothing_s: 0.001,
            baseline_span_s: 0.1,
            edge_gap_s: 0.005,
            min_plateau_s: None,
        }
    }
}

/// Input resistance / conductance configuration
///
/// A nonzero `current_amplitude_pa` selects current clamp; otherwise a nonzero
/// `voltage_step_mv` selects voltage clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RinOptions {
    /// Nominal current step (pA)
    pub current_amplitude_pa: f64,
    /// Nominal voltage step (mV)
    pub voltage_step_mv: f64,
    /// Window placement (default: auto-detect, falling back to 0–100 ms / 300–400 ms)
    pub windows: WindowSource,
    /// Edge detection settings used by [`WindowSource::Auto`]
    pub detect: DetectOptions,
    /// Sign handling (default: [`SignConvention::Mixed`])
    pub sign: SignConvention,
}

impl Default for RinOptions {
    fn default() -> Self {
        Self {
            current_amplitude_pa: 0.0,
            voltage_step_mv: 0.0,
            windows: WindowSource::default(),
            detect: DetectOptions::default(),
            sign: SignConvention::default(),
        }
    }
}

impl RinOptions {
    /// Current-clamp protocol with the given step (pA)
    pub fn current_clamp(current_amplitude_pa: f64) -> Self {
        Self {
            current_amplitude_pa,
            ..Default::default()
        }
    }

    /// Voltage-clamp protocol with the given step (mV)
    pub fn voltage_clamp(voltage_step_mv: f64) -> Self {
        Self {
            voltage_step_mv,
            ..Default::default()
        }
    }

    /// Use fixed baseline/response windows
    pub fn with_windows(mut self, baseline: Window, response: Window) -> Self {
        self.windows = WindowSource::Manual(PulseWindows { baseline, response });
        self
    }

    /// Detect windows automatically, using `fallback` if detection fails
    pub fn with_auto_detect(mut self, fallback: PulseWindows) -> Self {
        self.windows = WindowSource::Auto { fallback };
        self
    }

    pub fn with_detect(mut self, detect: DetectOptions) -> Self {
        self.detect = detect;
        self
    }

    /// Require at least this onset→offset duration for detected pulses
    pub fn with_min_plateau(mut self, min_plateau_s: f64) -> Self {
        self.detect.min_plateau_s = Some(min_plateau_s);
        self
    }

    pub fn with_sign(mut self, sign: SignConvention) -> Self {
        self.sign = sign;
        self
    }

    /// Clamp mode implied by the nominal amplitudes, if any is nonzero
    pub fn clamp_mode(&self) -> Option<ClampMode> {
        if self.current_amplitude_pa != 0.0 {
            Some(ClampMode::CurrentClamp)
        } else if self.voltage_step_mv != 0.0 {
            Some(ClampMode::VoltageClamp)
        } else {
            None
        }
    }
}

/// Exponential model used for the time-constant fit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TauModel {
    /// `V(t) = V_ss + (V_0 - V_ss)·exp(-t/τ)`
    #[default]
    Mono,
    /// `V(t) = V_ss + A_fast·exp(-t/τ_fast) + A_slow·exp(-t/τ_slow)`
    Bi,
}

impl TauModel {
    /// Minimum samples in the fit window
    pub fn min_samples(&self) -> usize {
        match self {
            TauModel::Mono => 3,
            TauModel::Bi => 6,
        }
    }

    /// Default evaluation cap
    pub fn default_max_evals(&self) -> u64 {
        match self {
            TauModel::Mono => 5000,
            TauModel::Bi => 10000,
        }
    }
}

impl fmt::Display for TauModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TauModel::Mono => write!(f, "mono"),
            TauModel::Bi => write!(f, "bi"),
        }
    }
}

/// Membrane time-constant configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TauOptions {
    /// Start of the fit window (s, default: 0.1)
    pub stim_start_s: f64,
    /// Length of the fit window (s, default: 0.05)
    pub fit_duration_s: f64,
    /// Model to fit (default: mono)
    pub model: TauModel,
    /// Bounds on every τ (s, default: (1e-4, 1.0))
    pub tau_bounds_s: (f64, f64),
    /// Evaluation cap (default: 5000 mono, 10000 bi)
    pub max_evals: Option<u64>,
}

impl Default for TauOptions {
    fn default() -> Self {
        Self {
            stim_start_s: 0.1,
            fit_duration_s: 0.05,
            model: TauModel::Mono,
            tau_bounds_s: (1e-4, 1.0),
            max_evals: None,
        }
    }
}

impl TauOptions {
    pub fn with_fit_window(mut self, stim_start_s: f64, fit_duration_s: f64) -> Self {
        self.stim_start_s = stim_start_s;
        self.fit_duration_s = fit_duration_s;
        self
    }

    pub fn with_model(mut self, model: TauModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_tau_bounds(mut self, min_s: f64, max_s: f64) -> Self {
        self.tau_bounds_s = (min_s, max_s);
        self
    }

    pub fn with_max_evals(mut self, max_evals: u64) -> Self {
        self.max_evals = Some(max_evals);
        self
    }

    /// Evaluation cap after resolving the per-model default
    pub fn max_evals(&self) -> u64 {
        self.max_evals
            .unwrap_or_else(|| self.model.default_max_evals())
    }

    /// `[stim_start, stim_start + fit_duration)`
    pub fn fit_window(&self) -> Result<Window, WindowError> {
        Window::new(self.stim_start_s, self.stim_start_s + self.fit_duration_s)
    }
}

/// Sag-ratio configuration: three disjoint windows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SagOptions {
    pub baseline: Window,
    /// Window searched for the hyperpolarized peak
    pub peak: Window,
    pub steady_state: Window,
    /// Percentile used as the robust minimum (default: 1.0)
    pub peak_percentile: f64,
    /// Use the percentile only when the peak window holds more samples (default: 10)
    pub percentile_min_samples: usize,
}

impl SagOptions {
    pub fn new(baseline: Window, peak: Window, steady_state: Window) -> Self {
        Self {
            baseline,
            peak,
            steady_state,
            peak_percentile: 1.0,
            percentile_min_samples: 10,
        }
    }

    pub fn with_peak_percentile(mut self, percentile: f64) -> Self {
        self.peak_percentile = percentile;
        self
    }
}

/// Resting-membrane-potential configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RmpOptions {
    pub window: Window,
}

impl RmpOptions {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Resistance/conductance result envelope
///
/// Both clamp modes fill the same shape. An invalid result never carries a
/// value and always carries a non-empty error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RinResult {
    pub(crate) value: Option<f64>,
    pub(crate) unit: String,
    pub(crate) conductance: Option<f64>,
    pub(crate) voltage_deflection: Option<f64>,
    pub(crate) current_injection: Option<f64>,
    pub(crate) baseline_voltage: Option<f64>,
    pub(crate) steady_state_voltage: Option<f64>,
    pub(crate) baseline_current: Option<f64>,
    pub(crate) steady_state_current: Option<f64>,
    pub(crate) is_valid: bool,
    pub(crate) error_message: Option<String>,
    pub(crate) parameters: Map<String, Value>,
    pub(crate) mode: Option<ClampMode>,
    pub(crate) windows: Option<PulseWindows>,
    pub(crate) auto_detected: bool,
}

impl RinResult {
    pub(crate) const UNIT: &'static str = "MOhm";

    /// An empty, valid envelope to be filled by the estimators
    pub(crate) fn empty(mode: Option<ClampMode>, parameters: Map<String, Value>) -> Self {
        Self {
            value: None,
            unit: Self::UNIT.to_string(),
            conductance: None,
            voltage_deflection: None,
            current_injection: None,
            baseline_voltage: None,
            steady_state_voltage: None,
            baseline_current: None,
            steady_state_current: None,
            is_valid: true,
            error_message: None,
            parameters,
            mode,
            windows: None,
            auto_detected: false,
        }
    }

    /// Invalid envelope carrying `message`
    pub(crate) fn invalid(
        mode: Option<ClampMode>,
        message: impl Into<String>,
        parameters: Map<String, Value>,
    ) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = "Unknown error".to_string();
        }
        Self {
            is_valid: false,
            error_message: Some(message),
            ..Self::empty(mode, parameters)
        }
    }

    /// Input resistance (MOhm)
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Conductance (µS)
    pub fn conductance(&self) -> Option<f64> {
        self.conductance
    }

    /// Voltage deflection (mV); the imposed step in voltage clamp
    pub fn voltage_deflection(&self) -> Option<f64> {
        self.voltage_deflection
    }

    /// Injected current (pA); the measured current deflection in voltage clamp
    pub fn current_injection(&self) -> Option<f64> {
        self.current_injection
    }

    pub fn baseline_voltage(&self) -> Option<f64> {
        self.baseline_voltage
    }

    pub fn steady_state_voltage(&self) -> Option<f64> {
        self.steady_state_voltage
    }

    pub fn baseline_current(&self) -> Option<f64> {
        self.baseline_current
    }

    pub fn steady_state_current(&self) -> Option<f64> {
        self.steady_state_current
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Inputs used to compute the result
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn mode(&self) -> Option<ClampMode> {
        self.mode
    }

    /// Windows the estimate was taken from
    pub fn windows(&self) -> Option<&PulseWindows> {
        self.windows.as_ref()
    }

    /// Whether the windows came from pulse detection
    pub fn auto_detected(&self) -> bool {
        self.auto_detected
    }
}

impl fmt::Display for RinResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid {
            return write!(
                f,
                "Rin: invalid ({})",
                self.error_message.as_deref().unwrap_or("")
            );
        }
        match (self.value, self.conductance) {
            (Some(r), Some(g)) => write!(f, "Rin: {:.2} {} (G = {:.4} µS)", r, self.unit, g),
            (Some(r), None) => write!(f, "Rin: {:.2} {}", r, self.unit),
            _ => write!(f, "Rin: n/a"),
        }
    }
}

/// Mono-exponential fit result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonoExpFit {
    pub tau_ms: f64,
    pub v_ss: f64,
    pub v_0: f64,
    pub r_squared: f64,
    pub rmse_mv: f64,
    pub n_samples: usize,
}

/// Bi-exponential fit result, with `tau_fast_ms <= tau_slow_ms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiExpFit {
    pub tau_fast_ms: f64,
    pub tau_slow_ms: f64,
    pub amplitude_fast: f64,
    pub amplitude_slow: f64,
    pub v_ss: f64,
    pub r_squared: f64,
    pub rmse_mv: f64,
    pub n_samples: usize,
}

/// Membrane time-constant result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TauResult {
    Mono(MonoExpFit),
    Bi(BiExpFit),
}

impl TauResult {
    pub fn model(&self) -> TauModel {
        match self {
            TauResult::Mono(_) => TauModel::Mono,
            TauResult::Bi(_) => TauModel::Bi,
        }
    }

    /// Time constant that governs membrane charging: τ for mono, τ_slow for bi
    pub fn membrane_tau_ms(&self) -> f64 {
        match self {
            TauResult::Mono(fit) => fit.tau_ms,
            TauResult::Bi(fit) => fit.tau_slow_ms,
        }
    }

    pub fn r_squared(&self) -> f64 {
        match self {
            TauResult::Mono(fit) => fit.r_squared,
            TauResult::Bi(fit) => fit.r_squared,
        }
    }

    pub fn rmse_mv(&self) -> f64 {
        match self {
            TauResult::Mono(fit) => fit.rmse_mv,
            TauResult::Bi(fit) => fit.rmse_mv,
        }
    }
}

/// Sag-ratio result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagResult {
    /// `(V_peak - V_baseline) / (V_ss - V_baseline)`
    pub sag_ratio: f64,
    /// `100·(V_peak - V_ss) / (V_peak - V_baseline)`, if defined
    pub sag_percent: Option<f64>,
    pub v_baseline: f64,
    pub v_peak: f64,
    pub v_steady_state: f64,
}

/// Resting-membrane-potential result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmpResult {
    pub rmp_mv: f64,
    /// Population standard deviation
    pub std_mv: f64,
    /// Least-squares slope over the window; `None` with fewer than two distinct times
    pub drift_mv_per_s: Option<f64>,
    pub n_samples: usize,
}
