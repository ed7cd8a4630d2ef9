//! Access to the Cortex REST API.
//!
//! # Module Structure
//!
//! - [`errors`] - Error types for API operations
//! - [`types`] - The [`ResourceGateway`] trait and its value types
//! - [`client`] - The reqwest-backed [`CortexClient`]
//!
//! The reconciliation engine only sees [`ResourceGateway`], so tests can swap
//! the HTTP client for an in-memory fake.

mod client;
mod errors;
mod types;

pub use client::{CortexClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use errors::{GatewayError, short_error_message};
pub use types::{AuthToken, CreateOutcome, ResourceGateway};
