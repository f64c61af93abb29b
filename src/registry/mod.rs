//! Name-based dispatch of analyses over flat records
//!
//! A [`Registry`] maps an analysis name to its function and metadata. It is an
//! ordinary value: build it once with [`Registry::builtin`] (or assemble one
//! with [`Registry::register`]) and hand it to whoever dispatches analyses.
//!
//! Every analysis takes a trace plus loosely-typed keyword arguments and
//! returns a flat record whose keys map directly to table columns. Failures
//! are data: the primary values become `null` and an `*_error` key carries the
//! message, so one bad trial never stops a batch.
//!
//! # Example
//!
//! ```rust,ignore
//! use ephysol::registry::{Kwargs, Registry};
//! use serde_json::json;
//!
//! let registry = Registry::builtin();
//! let kwargs: Kwargs = serde_json::from_value(json!({ "current_amplitude": -50.0 }))?;
//!
//! let record = registry.run("rin_analysis", &voltage, &time, 20_000.0, &kwargs)?;
//! println!("Rin: {}", record["rin_mohm"]);
//! ```

mod adapters;
pub mod kwargs;

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::data::Trace;

pub use adapters::{
    run_passive_properties, run_rin_analysis, run_rmp_analysis, run_sag_ratio_analysis,
    run_tau_analysis, PASSIVE_PROPERTIES, RIN_ANALYSIS, RMP_ANALYSIS, SAG_RATIO_ANALYSIS,
    TAU_ANALYSIS,
};
use adapters::failure_record;

/// Keyword arguments of an analysis
pub type Kwargs = Map<String, Value>;

/// Flat analysis output, one value per column
pub type Record = Map<String, Value>;

/// Uniform analysis signature
pub type AnalysisFn = fn(&Trace, &Kwargs) -> Record;

/// Description of a registered analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMeta {
    pub name: &'static str,
    /// Human-readable name
    pub label: &'static str,
    pub description: &'static str,
    /// Recognized keyword arguments
    pub options: &'static [&'static str],
    /// Key carrying the error message of a failed run
    pub error_key: &'static str,
    /// Main result values of the analysis
    pub primary_keys: &'static [&'static str],
    /// Every key of a record, in any outcome
    pub columns: &'static [&'static str],
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Unknown analysis: {0}")]
    UnknownAnalysis(String),
    #[error("Analysis already registered: {0}")]
    DuplicateAnalysis(&'static str),
}

/// Mapping from analysis name to `(function, metadata)`
#[derive(Clone, Default)]
pub struct Registry {
    entries: HashMap<&'static str, (AnalysisFn, AnalysisMeta)>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("analyses", &self.names())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the passive-property analyses
    pub fn builtin() -> Self {
        let builtins: [(AnalysisFn, AnalysisMeta); 5] = [
            (run_rin_analysis, RIN_ANALYSIS),
            (run_tau_analysis, TAU_ANALYSIS),
            (run_sag_ratio_analysis, SAG_RATIO_ANALYSIS),
            (run_rmp_analysis, RMP_ANALYSIS),
            (run_passive_properties, PASSIVE_PROPERTIES),
        ];

        let mut registry = Self::new();
        for (function, meta) in builtins {
            registry.entries.insert(meta.name, (function, meta));
        }
        registry
    }

    /// Add an analysis under `meta.name`
    pub fn register(
        &mut self,
        function: AnalysisFn,
        meta: AnalysisMeta,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(meta.name) {
            return Err(RegistryError::DuplicateAnalysis(meta.name));
        }
        self.entries.insert(meta.name, (function, meta));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AnalysisMeta> {
        self.entries.get(name).map(|(_, meta)| meta)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `name` on raw arrays
    ///
    /// Only an unknown name is an error. A malformed trace (length mismatch,
    /// bad time vector or sampling rate) comes back as a failure record.
    pub fn run(
        &self,
        name: &str,
        data: &[f64],
        time: &[f64],
        sampling_rate: f64,
        kwargs: &Kwargs,
    ) -> Result<Record, RegistryError> {
        let (function, meta) = self.lookup(name)?;
        match Trace::new(data.to_vec(), time.to_vec(), sampling_rate) {
            Ok(trace) => Ok(guarded(*function, meta, &trace, kwargs)),
            Err(err) => {
                tracing::warn!(analysis = name, %err, "rejected malformed trace");
                Ok(failure_record(meta, &err.to_string()))
            }
        }
    }

    /// Run `name` on an already validated trace
    pub fn run_trace(
        &self,
        name: &str,
        trace: &Trace,
        kwargs: &Kwargs,
    ) -> Result<Record, RegistryError> {
        let (function, meta) = self.lookup(name)?;
        Ok(guarded(*function, meta, trace, kwargs))
    }

    /// Run `name` on every trace in parallel, keeping the input order
    ///
    /// With `progress` set, a progress bar is drawn on stderr.
    pub fn run_batch(
        &self,
        name: &str,
        traces: &[Trace],
        kwargs: &Kwargs,
        progress: bool,
    ) -> Result<Vec<Record>, RegistryError> {
        let (function, meta) = self.lookup(name)?;
        let bar = progress_bar(name, traces.len(), progress);

        let records: Vec<Record> = traces
            .par_iter()
            .map(|trace| {
                let record = guarded(*function, meta, trace, kwargs);
                bar.inc(1);
                record
            })
            .collect();

        bar.finish_and_clear();
        Ok(records)
    }

    fn lookup(&self, name: &str) -> Result<&(AnalysisFn, AnalysisMeta), RegistryError> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownAnalysis(name.to_string()))
    }
}

/// Call `function`, turning a panic into a failure record
fn guarded(function: AnalysisFn, meta: &AnalysisMeta, trace: &Trace, kwargs: &Kwargs) -> Record {
    match catch_unwind(AssertUnwindSafe(|| function(trace, kwargs))) {
        Ok(record) => record,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "analysis panicked".to_string());
            tracing::error!(
                analysis = meta.name,
                n_samples = trace.len(),
                %message,
                "analysis panicked"
            );
            failure_record(meta, &message)
        }
    }
}

fn progress_bar(name: &str, len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    let template = "{msg} [{elapsed_precise}] {bar:40} {pos}/{len} ({eta})";
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(name.to_string());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kwargs(value: Value) -> Kwargs {
        match value {
            Value::Object(map) => map,
            _ => panic!("kwargs must be an object"),
        }
    }

    fn panicking(_: &Trace, _: &Kwargs) -> Record {
        panic!("boom")
    }

    const PANICKING: AnalysisMeta = AnalysisMeta {
        name: "panicking",
        label: "Panicking",
        description: "Always panics",
        options: &[],
        error_key: "panicking_error",
        primary_keys: &["value"],
        columns: &["value", "panicking_error"],
    };

    #[test]
    fn test_builtin_names() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.names(),
            vec![
                "passive_properties",
                "rin_analysis",
                "rmp_analysis",
                "sag_ratio_analysis",
                "tau_analysis"
            ]
        );
        assert_eq!(registry.get("tau_analysis").unwrap().error_key, "tau_error");
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = Registry::builtin();
        assert_eq!(
            registry.register(run_rin_analysis, RIN_ANALYSIS),
            Err(RegistryError::DuplicateAnalysis("rin_analysis"))
        );
    }

    #[test]
    fn test_unknown_analysis() {
        let registry = Registry::builtin();
        let result = registry.run("spike_count", &[0.0], &[0.0], 1000.0, &Kwargs::new());
        assert_eq!(result, Err(RegistryError::UnknownAnalysis("spike_count".to_string())));
    }

    #[test]
    fn test_malformed_trace_is_failure_record() {
        let registry = Registry::builtin();
        let record = registry
            .run("rin_analysis", &[1.0, 2.0, 3.0], &[0.0, 0.001], 1000.0, &Kwargs::new())
            .unwrap();
        assert_eq!(record["rin_mohm"], Value::Null);
        assert!(record["rin_error"].as_str().unwrap().contains("length"));
        assert_eq!(record.len(), RIN_ANALYSIS.columns.len());
        assert_eq!(record["baseline_current_pa"], Value::Null);
    }

    #[test]
    fn test_panic_is_trapped() {
        let mut registry = Registry::new();
        registry.register(panicking, PANICKING).unwrap();
        let record = registry
            .run("panicking", &[0.0, 1.0], &[0.0, 0.001], 1000.0, &Kwargs::new())
            .unwrap();
        assert_eq!(record["value"], Value::Null);
        assert_eq!(record["panicking_error"], json!("boom"));
    }

    #[test]
    fn test_zero_amplitudes_record() {
        let registry = Registry::builtin();
        let record = registry
            .run(
                "rin_analysis",
                &[-65.0; 10],
                &[0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
                10.0,
                &kwargs(json!({ "current_amplitude": 0.0, "voltage_step": 0.0 })),
            )
            .unwrap();
        assert_eq!(record["rin_mohm"], Value::Null);
        assert!(!record["rin_error"].as_str().unwrap().is_empty());
    }
}
