use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use super::errors::GatewayError;
use crate::dataset::Account;
use crate::resource::{RemoteResource, ResourceId, ResourceKind};

/// Bearer token obtained from `auth/authenticate`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// What a create call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The server created the resource and returned it.
    Created(RemoteResource),
    /// The server says the resource already exists (409).
    Conflict,
    /// The server accepted the request without returning a resource (202).
    Accepted,
}

/// The remote side of a seeding run.
///
/// Implemented over HTTP by [`super::CortexClient`]; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<AuthToken, GatewayError>;

    /// Register an account without authentication.
    async fn register(&self, account: &Account) -> Result<CreateOutcome, GatewayError>;

    /// Activate a freshly registered account with the emailed token.
    async fn activate_account(&self, activation_token: &str) -> Result<(), GatewayError>;

    /// List every resource of a kind currently on the server.
    async fn list(
        &self,
        kind: ResourceKind,
        token: &AuthToken,
    ) -> Result<Vec<RemoteResource>, GatewayError>;

    /// Create one resource from a JSON payload.
    async fn create(
        &self,
        kind: ResourceKind,
        token: &AuthToken,
        payload: &serde_json::Value,
    ) -> Result<CreateOutcome, GatewayError>;

    /// Attach an image file to an existing resource.
    async fn upload_asset(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        token: &AuthToken,
        file: &Path,
    ) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_token_debug_is_redacted() {
        let token = AuthToken::new("eyJhbGciOi");
        assert_eq!(format!("{token:?}"), "AuthToken(***)");
        assert_eq!(token.as_str(), "eyJhbGciOi");
    }

    #[test]
    fn gateway_is_object_safe() {
        fn assert_object_safe(_: Option<&dyn ResourceGateway>) {}
        assert_object_safe(None);
    }
}
