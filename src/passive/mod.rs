//! Passive membrane properties from step-protocol recordings
//!
//! This module computes the passive properties used to characterize neurons
//! from a single sweep recorded during a current- or voltage-step protocol.
//!
//! # Key Parameters
//!
//! | Parameter | Description |
//! |-----------|-------------|
//! | Rin | Input resistance, ΔV / I (current clamp) or 1 / G (voltage clamp) |
//! | G | Conductance, ΔI / ΔV (voltage clamp) |
//! | τ | Membrane time constant from a mono- or bi-exponential fit |
//! | Cm | Membrane capacitance, τ / Rin |
//! | Sag | Peak-to-steady-state ratio of a hyperpolarizing response |
//! | RMP | Resting membrane potential and its drift |
//!
//! # Usage
//!
//! ```rust,ignore
//! use ephysol::prelude::*;
//!
//! let trace = Trace::new(voltage, time, 20_000.0)?;
//!
//! // Windows are detected from the step edges unless given explicitly
//! let rin = trace.input_resistance(&RinOptions::current_clamp(-50.0));
//! if rin.is_valid() {
//!     println!("Rin: {:.1} MOhm", rin.value().unwrap());
//! }
//!
//! let tau = trace.tau(&TauOptions::default().with_fit_window(0.2, 0.1))?;
//! println!("tau: {:.2} ms", tau.membrane_tau_ms());
//! ```
//!
//! All functions are pure: they read only their arguments, hold no shared
//! state, and can run concurrently on independent traces.

mod calc;
mod detect;
mod error;
mod rin;
mod rmp;
mod sag;
mod tau;
mod traits;
mod types;


pub use calc::{is_close, moving_average, percentile};
pub use detect::{detect_pulse, PulseEdges};
pub use error::PassiveError;
pub use rin::{calculate_rin, conductance_voltage_clamp, resolve_windows, rin_current_clamp};
pub use rmp::calculate_rmp;
pub use sag::calculate_sag_ratio;
pub use tau::{calculate_capacitance, calculate_tau};
pub use traits::{Passive, PassiveBatch};
pub use types::{
    BiExpFit, ClampMode, DetectOptions, MonoExpFit, RinOptions, RinResult, RmpOptions, RmpResult,
    SagOptions, SagResult, SignConvention, TauModel, TauOptions, TauResult,
};
