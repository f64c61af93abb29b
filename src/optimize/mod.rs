//! Bounded curve fitting on top of argmin's Nelder–Mead solver

pub mod bounds;
pub mod least_squares;

pub use bounds::Bound;
pub use least_squares::{fit_least_squares, FitError, FitOutcome};
