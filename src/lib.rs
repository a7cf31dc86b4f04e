//! Somni Drift - Personal sleep-deviation engine
//!
//! Somni turns a history of nightly sleep records into a description of how the
//! most recent week departs from the person's own baseline through a
//! deterministic pipeline: windowing → baseline statistics → z-scores and
//! trends → variability → SHDI and phenotype classification.
//!
//! ## Modules
//!
//! - **Engine**: `window`, `baseline`, `deviation`, `trend`, `variability`, `shdi`, `phenotype`
//! - **Boundary**: `adapters` (Fitbit/Oura/Apple Health/JSON exports), `validation`, `store`, `ffi`

pub mod adapters;
pub mod analyzer;
pub mod baseline;
pub mod config;
pub mod deviation;
pub mod error;
pub mod phenotype;
pub mod shdi;
pub mod stats;
pub mod store;
pub mod trend;
pub mod types;
pub mod validation;
pub mod variability;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use analyzer::{analyze, analyze_json, SleepAnalyzer};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use store::{analyze_cached, InMemoryResultStore, ResultStore};
pub use types::{
    RiskPattern, RiskPhenotype, ShdiCategory, ShdiScore, SleepAnalysisResult, SleepRecord,
};
pub use validation::{validate_records, ValidationReport};

/// Library version
pub const SOMNI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "somni-drift";
