//! Idempotent reconciliation of a dataset against a Cortex instance.
//!
//! # Module Structure
//!
//! - [`types`] - Outcomes, per-kind results, options and run states
//! - [`progress`] - Progress reporting: `SeedProgress`, `ProgressCallback`, `emit()`
//! - [`matcher`] - Natural-key index over existing server resources
//! - [`engine`] - Per-kind create-or-skip reconciliation
//! - [`orchestrator`] - The full run state machine
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cortex_seed::gateway::{CortexClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
//! use cortex_seed::dataset::DatasetSource;
//! use cortex_seed::seed::{SeedOptions, SeedRun};
//!
//! let client = CortexClient::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)?;
//! let run = SeedRun::new(Arc::new(client), SeedOptions::default());
//! let report = run.run_source(&DatasetSource::new("data.json"), None).await;
//! for kind in report.summary() {
//!     println!("{}: {} created", kind.kind, kind.created);
//! }
//! ```

pub mod engine;
pub mod matcher;
pub mod orchestrator;
mod progress;
mod types;

pub use engine::{ParentLookup, Reconciler};
pub use matcher::ExistenceIndex;
pub use orchestrator::{RunReport, SeedError, SeedRun};
pub use progress::{ProgressCallback, SeedProgress, emit};
pub use types::{
    DEFAULT_CONCURRENCY, ItemResult, KindSummary, MISSING_PARENT_ID, Outcome,
    ReconciliationResult, RunState, SeedOptions, SkipReason,
};
