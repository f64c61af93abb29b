pub mod error;
pub mod trace;
pub mod window;

pub use error::{TraceError, WindowError};
pub use trace::Trace;
pub use window::{slice_window, slice_window_with_time, PulseWindows, Window, WindowSource};
