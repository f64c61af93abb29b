pub mod data;
pub mod error;
pub mod optimize;
pub mod passive;
pub mod registry;
pub mod synthetic;

pub use crate::data::*;
pub use crate::passive::*;
pub use error::EphysError;
pub use registry::{AnalysisFn, AnalysisMeta, Kwargs, Record, Registry, RegistryError};

pub mod prelude {
    pub mod data {
        pub use crate::data::{PulseWindows, Trace, Window, WindowSource};
    }
    pub mod passive {
        pub use crate::passive::{
            calculate_capacitance, calculate_rin, calculate_rmp, calculate_sag_ratio,
            calculate_tau, detect_pulse, ClampMode, RinOptions, RinResult, RmpOptions, SagOptions,
            SignConvention, TauModel, TauOptions, TauResult,
        };
    }

    //extension traits
    pub use crate::passive::{Passive, PassiveBatch};

    pub use crate::data::{PulseWindows, Trace, Window, WindowSource};
    pub use crate::passive::{
        calculate_capacitance, calculate_rin, calculate_rmp, calculate_sag_ratio, calculate_tau,
        ClampMode, RinOptions, RinResult, RmpOptions, SagOptions, SignConvention, TauModel,
        TauOptions, TauResult,
    };
    pub use crate::registry::{Kwargs, Record, Registry};
    pub use crate::EphysError;
}
