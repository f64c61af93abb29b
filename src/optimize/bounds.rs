//! Box constraints for the unconstrained simplex solver
//!
//! Nelder–Mead has no notion of bounds, so bounded parameters are optimized in
//! an internal space and mapped onto `[lo, hi]` through a logistic transform.
//! Unbounded parameters pass through unchanged.

use serde::{Deserialize, Serialize};

/// Smallest distance from a bound, as a fraction of the range, when mapping inward
const EDGE_FRACTION: f64 = 1e-9;

/// Bound on a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    Free,
    Interval { lo: f64, hi: f64 },
}

impl Bound {
    /// Closed interval; `None` if `lo >= hi` or either end is non-finite
    pub fn interval(lo: f64, hi: f64) -> Option<Self> {
        if lo.is_finite() && hi.is_finite() && lo < hi {
            Some(Bound::Interval { lo, hi })
        } else {
            None
        }
    }

    /// Map an external (physical) value into optimizer space
    pub fn to_internal(&self, value: f64) -> f64 {
        match *self {
            Bound::Free => value,
            Bound::Interval { lo, hi } => {
                let p = ((value - lo) / (hi - lo)).clamp(EDGE_FRACTION, 1.0 - EDGE_FRACTION);
                (p / (1.0 - p)).ln()
            }
        }
    }

    /// Map an optimizer-space value back to the physical range
    pub fn to_external(&self, internal: f64) -> f64 {
        match *self {
            Bound::Free => internal,
            Bound::Interval { lo, hi } => lo + (hi - lo) / (1.0 + (-internal).exp()),
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        match *self {
            Bound::Free => value,
            Bound::Interval { lo, hi } => value.clamp(lo, hi),
        }
    }
}
