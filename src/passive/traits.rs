//! Extension traits for running passive-property analysis on traces
//!
//! ```rust,ignore
//! use ephysol::prelude::*;
//!
//! let rin = trace.input_resistance(&RinOptions::current_clamp(-50.0));
//! let tau = trace.tau(&TauOptions::default())?;
//! ```

use rayon::prelude::*;

use super::error::PassiveError;
use super::rin::calculate_rin;
use super::rmp::calculate_rmp;
use super::sag::calculate_sag_ratio;
use super::tau::calculate_tau;
use super::types::*;
use crate::data::Trace;

/// Passive-property analysis of a single trace
pub trait Passive {
    /// Input resistance / conductance; failures are reported inside the envelope
    fn input_resistance(&self, options: &RinOptions) -> RinResult;

    /// Membrane time constant(s)
    fn tau(&self, options: &TauOptions) -> Result<TauResult, PassiveError>;

    /// Hyperpolarization sag ratio
    fn sag(&self, options: &SagOptions) -> Result<SagResult, PassiveError>;

    /// Resting membrane potential
    fn rmp(&self, options: &RmpOptions) -> Result<RmpResult, PassiveError>;
}

impl Passive for Trace {
    fn input_resistance(&self, options: &RinOptions) -> RinResult {
        calculate_rin(self, options)
    }

    fn tau(&self, options: &TauOptions) -> Result<TauResult, PassiveError> {
        calculate_tau(self, options)
    }

    fn sag(&self, options: &SagOptions) -> Result<SagResult, PassiveError> {
        calculate_sag_ratio(self, options)
    }

    fn rmp(&self, options: &RmpOptions) -> Result<RmpResult, PassiveError> {
        calculate_rmp(self, options)
    }
}

/// Parallel analysis over many independent traces
///
/// Results keep the input order.
pub trait PassiveBatch {
    fn input_resistance_all(&self, options: &RinOptions) -> Vec<RinResult>;

    fn tau_all(&self, options: &TauOptions) -> Vec<Result<TauResult, PassiveError>>;

    fn sag_all(&self, options: &SagOptions) -> Vec<Result<SagResult, PassiveError>>;
}

impl PassiveBatch for [Trace] {
    fn input_resistance_all(&self, options: &RinOptions) -> Vec<RinResult> {
        self.par_iter()
            .map(|trace| trace.input_resistance(options))
            .collect()
    }

    fn tau_all(&self, options: &TauOptions) -> Vec<Result<TauResult, PassiveError>> {
        self.par_iter().map(|trace| trace.tau(options)).collect()
    }

    fn sag_all(&self, options: &SagOptions) -> Vec<Result<SagResult, PassiveError>> {
        self.par_iter().map(|trace| trace.sag(options)).collect()
    }
}
