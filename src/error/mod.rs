use thiserror::Error;

use crate::data::{TraceError, WindowError};
use crate::optimize::FitError;
use crate::passive::PassiveError;
use crate::registry::RegistryError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphysError {
    #[error("Invalid trace: {0}")]
    Trace(#[from] TraceError),
    #[error("Invalid window: {0}")]
    Window(#[from] WindowError),
    #[error("Curve fit failed: {0}")]
    Fit(#[from] FitError),
    #[error(transparent)]
    Passive(#[from] PassiveError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
