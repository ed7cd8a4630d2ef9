//! Cortex Seed - idempotent seeding for the Cortex education platform.
//!
//! This library loads a declarative dataset (users, courses, modules,
//! lessons, roadmaps) and makes it exist on a Cortex backend. Resources that
//! are already present are matched by natural key and skipped, so a run can
//! be repeated safely.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cortex_seed::{CortexClient, DatasetSource, SeedOptions, SeedRun};
//!
//! let client = CortexClient::new("http://localhost:8080/api/v1", cortex_seed::gateway::DEFAULT_TIMEOUT)?;
//! let report = SeedRun::new(Arc::new(client), SeedOptions::default())
//!     .run_source(&DatasetSource::new("data.json"), None)
//!     .await;
//!
//! if report.has_failures() {
//!     eprintln!("some resources could not be created");
//! }
//! ```

pub mod assets;
pub mod dataset;
pub mod gateway;
pub mod http;
pub mod resource;
pub mod seed;

pub use assets::{AssetError, AssetMatch, AssetResolver};
pub use dataset::{Dataset, DatasetSource, LoadError, ResourceSpec};
pub use gateway::{AuthToken, CortexClient, CreateOutcome, GatewayError, ResourceGateway};
pub use resource::{RemoteResource, ResourceId, ResourceKind};
pub use seed::{
    Outcome, ProgressCallback, ReconciliationResult, RunReport, RunState, SeedError, SeedOptions,
    SeedProgress, SeedRun,
};
