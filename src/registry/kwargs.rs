//! Typed views of the loosely-typed keyword arguments
//!
//! Each analysis deserializes the shared [`Kwargs`] map into its own struct.
//! Missing keys take their defaults and unknown keys are ignored, so one map
//! can drive several analyses at once.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Kwargs;
use crate::data::{PulseWindows, Window, WindowSource};
use crate::passive::{
    DetectOptions, PassiveError, RinOptions, RmpOptions, SagOptions, SignConvention, TauModel,
    TauOptions,
};

/// Deserialize `kwargs` into `T`, reporting type errors as invalid parameters
pub fn parse<T: DeserializeOwned>(kwargs: &Kwargs) -> Result<T, PassiveError> {
    serde_json::from_value(Value::Object(kwargs.clone())).map_err(|e| {
        PassiveError::InvalidParameter {
            param: "kwargs".to_string(),
            value: e.to_string(),
        }
    })
}

/// Keyword arguments of `rin_analysis`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RinKwargs {
    /// pA
    pub current_amplitude: f64,
    /// mV
    pub voltage_step: f64,
    pub auto_detect_pulse: bool,
    pub baseline_start: f64,
    pub baseline_end: f64,
    pub response_start: f64,
    pub response_end: f64,
    pub sign_convention: SignConvention,
    /// Minimum onset→offset duration for a detection to be accepted (s)
    pub min_plateau: Option<f64>,
}

impl Default for RinKwargs {
    fn default() -> Self {
        let windows = PulseWindows::default();
        Self {
            current_amplitude: 0.0,
            voltage_step: 0.0,
            auto_detect_pulse: true,
            baseline_start: windows.baseline.start(),
            baseline_end: windows.baseline.end(),
            response_start: windows.response.start(),
            response_end: windows.response.end(),
            sign_convention: SignConvention::default(),
            min_plateau: None,
        }
    }
}

impl RinKwargs {
    /// The explicit window fields become the fallback when auto detection is on
    pub fn into_options(self) -> Result<RinOptions, PassiveError> {
        let windows = PulseWindows {
            baseline: Window::new(self.baseline_start, self.baseline_end)?,
            response: Window::new(self.response_start, self.response_end)?,
        };
        let source = if self.auto_detect_pulse {
            WindowSource::Auto { fallback: windows }
        } else {
            WindowSource::Manual(windows)
        };
        Ok(RinOptions {
            current_amplitude_pa: self.current_amplitude,
            voltage_step_mv: self.voltage_step,
            windows: source,
            detect: DetectOptions {
                min_plateau_s: self.min_plateau,
                ..Default::default()
            },
            sign: self.sign_convention,
        })
    }
}

/// Keyword arguments of `tau_analysis`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TauKwargs {
    pub stim_start_time: f64,
    pub fit_duration: f64,
    pub tau_model: TauModel,
    pub tau_bound_min: f64,
    pub tau_bound_max: f64,
    pub max_evals: Option<u64>,
}

impl Default for TauKwargs {
    fn default() -> Self {
        let options = TauOptions::default();
        Self {
            stim_start_time: options.stim_start_s,
            fit_duration: options.fit_duration_s,
            tau_model: options.model,
            tau_bound_min: options.tau_bounds_s.0,
            tau_bound_max: options.tau_bounds_s.1,
            max_evals: options.max_evals,
        }
    }
}

impl From<TauKwargs> for TauOptions {
    fn from(kwargs: TauKwargs) -> Self {
        TauOptions {
            stim_start_s: kwargs.stim_start_time,
            fit_duration_s: kwargs.fit_duration,
            model: kwargs.tau_model,
            tau_bounds_s: (kwargs.tau_bound_min, kwargs.tau_bound_max),
            max_evals: kwargs.max_evals,
        }
    }
}

/// Keyword arguments of `sag_ratio_analysis`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SagKwargs {
    pub baseline_start: f64,
    pub baseline_end: f64,
    pub peak_start: f64,
    pub peak_end: f64,
    pub steady_state_start: f64,
    pub steady_state_end: f64,
    pub peak_percentile: f64,
}

impl Default for SagKwargs {
    fn default() -> Self {
        Self {
            baseline_start: 0.0,
            baseline_end: 0.1,
            peak_start: 0.1,
            peak_end: 0.3,
            steady_state_start: 0.8,
            steady_state_end: 1.0,
            peak_percentile: 1.0,
        }
    }
}

impl SagKwargs {
    pub fn into_options(self) -> Result<SagOptions, PassiveError> {
        Ok(SagOptions::new(
            Window::new(self.baseline_start, self.baseline_end)?,
            Window::new(self.peak_start, self.peak_end)?,
            Window::new(self.steady_state_start, self.steady_state_end)?,
        )
        .with_peak_percentile(self.peak_percentile))
    }
}

/// Keyword arguments of `rmp_analysis`; shares the baseline keys with `rin_analysis`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmpKwargs {
    pub baseline_start: f64,
    pub baseline_end: f64,
}

impl Default for RmpKwargs {
    fn default() -> Self {
        Self {
            baseline_start: 0.0,
            baseline_end: 0.1,
        }
    }
}

impl RmpKwargs {
    pub fn into_options(self) -> Result<RmpOptions, PassiveError> {
        Ok(RmpOptions::new(Window::new(
            self.baseline_start,
            self.baseline_end,
        )?))
    }
}
