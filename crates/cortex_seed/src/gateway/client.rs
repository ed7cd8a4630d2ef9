//! HTTP implementation of [`ResourceGateway`] for the Cortex REST API.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::errors::GatewayError;
use super::types::{AuthToken, CreateOutcome, ResourceGateway};
use crate::dataset::Account;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{
    HttpBody, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartFile,
};
use crate::resource::{RemoteResource, ResourceId, ResourceKind};

/// Base URL of a locally running Cortex backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Multipart field the image endpoint reads the file from.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Cortex API client.
#[derive(Clone)]
pub struct CortexClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl CortexClient {
    /// Create a client backed by reqwest.
    ///
    /// `base_url` includes the API prefix, e.g. `http://localhost:8080/api/v1`.
    pub fn new(base_url: &str, timeout: StdDuration) -> Result<Self, GatewayError> {
        let transport =
            ReqwestTransport::with_timeout(timeout).map_err(|e| GatewayError::Config(e.to_string()))?;
        Ok(Self::new_with_transport(base_url, Arc::new(transport)))
    }

    pub fn new_with_transport(base_url: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn headers(token: Option<&AuthToken>) -> HttpHeaders {
        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), "cortex-seed".to_string()),
        ];
        if let Some(token) = token {
            headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", token.as_str()),
            ));
        }
        headers
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: String,
        token: Option<&AuthToken>,
        body: HttpBody,
    ) -> Result<HttpResponse, GatewayError> {
        let request = HttpRequest {
            method,
            url,
            headers: Self::headers(token),
            body,
        };

        self.transport
            .send(request)
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))
    }

    fn api_error(response: &HttpResponse) -> GatewayError {
        GatewayError::Api {
            status: response.status,
            message: response.text(),
        }
    }

    /// Interpret the response to a create-style POST.
    fn create_outcome(
        kind: ResourceKind,
        response: &HttpResponse,
    ) -> Result<CreateOutcome, GatewayError> {
        match response.status {
            409 => Ok(CreateOutcome::Conflict),
            202 => Ok(CreateOutcome::Accepted),
            s if (200..300).contains(&s) => {
                if response.body.iter().all(u8::is_ascii_whitespace) {
                    return Ok(CreateOutcome::Accepted);
                }
                let value: Value = serde_json::from_slice(&response.body)?;
                match RemoteResource::from_json(kind, &value) {
                    Some(resource) => Ok(CreateOutcome::Created(resource)),
                    None => {
                        tracing::warn!(%kind, "Create response has no id, treating as accepted");
                        Ok(CreateOutcome::Accepted)
                    }
                }
            }
            _ => Err(Self::api_error(response)),
        }
    }

    fn list_path(kind: ResourceKind) -> String {
        match kind {
            ResourceKind::User => "user/all".to_string(),
            other => format!("education/{other}"),
        }
    }

    fn create_path(kind: ResourceKind) -> String {
        match kind {
            ResourceKind::User => "auth/register".to_string(),
            other => format!("education/{other}"),
        }
    }
}

#[async_trait]
impl ResourceGateway for CortexClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthToken, GatewayError> {
        let body = HttpBody::json(&serde_json::json!({
            "username": username,
            "password": password,
        }))?;
        let response = self
            .send(HttpMethod::Post, self.url("auth/authenticate"), None, body)
            .await?;

        match response.status {
            401 | 403 => Err(GatewayError::Auth(format!(
                "credentials rejected for {username} (HTTP {})",
                response.status
            ))),
            s if (200..300).contains(&s) => {
                let parsed: TokenResponse = serde_json::from_slice(&response.body)?;
                match parsed.token {
                    Some(token) if !token.is_empty() => Ok(AuthToken::new(token)),
                    _ => Err(GatewayError::Auth("no token received".to_string())),
                }
            }
            _ => Err(Self::api_error(&response)),
        }
    }

    async fn register(&self, account: &Account) -> Result<CreateOutcome, GatewayError> {
        let body = HttpBody::json(account)?;
        let response = self
            .send(
                HttpMethod::Post,
                self.url(&Self::create_path(ResourceKind::User)),
                None,
                body,
            )
            .await?;
        Self::create_outcome(ResourceKind::User, &response)
    }

    async fn activate_account(&self, activation_token: &str) -> Result<(), GatewayError> {
        let url = reqwest::Url::parse_with_params(
            &self.url("auth/activate-account"),
            &[("token", activation_token)],
        )
        .map_err(|e| GatewayError::Config(e.to_string()))?;

        let response = self
            .send(HttpMethod::Get, url.to_string(), None, HttpBody::Empty)
            .await?;

        if response.is_success() {
            Ok(())
        } else {
            Err(Self::api_error(&response))
        }
    }

    async fn list(
        &self,
        kind: ResourceKind,
        token: &AuthToken,
    ) -> Result<Vec<RemoteResource>, GatewayError> {
        let response = self
            .send(
                HttpMethod::Get,
                self.url(&Self::list_path(kind)),
                Some(token),
                HttpBody::Empty,
            )
            .await?;

        if !response.is_success() {
            return Err(Self::api_error(&response));
        }

        let entries: Vec<Value> = serde_json::from_slice(&response.body)?;
        let total = entries.len();
        let resources: Vec<RemoteResource> = entries
            .iter()
            .filter_map(|entry| RemoteResource::from_json(kind, entry))
            .collect();

        if resources.len() < total {
            tracing::warn!(
                %kind,
                skipped = total - resources.len(),
                "Ignoring listed entries without an id"
            );
        }

        Ok(resources)
    }

    async fn create(
        &self,
        kind: ResourceKind,
        token: &AuthToken,
        payload: &Value,
    ) -> Result<CreateOutcome, GatewayError> {
        let body = HttpBody::json(payload)?;
        let response = self
            .send(
                HttpMethod::Post,
                self.url(&Self::create_path(kind)),
                Some(token),
                body,
            )
            .await?;
        Self::create_outcome(kind, &response)
    }

    async fn upload_asset(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        token: &AuthToken,
        file: &Path,
    ) -> Result<(), GatewayError> {
        if !kind.accepts_assets() {
            return Err(GatewayError::Unsupported {
                operation: "image upload",
                kind,
            });
        }

        let bytes = tokio::fs::read(file).await.map_err(|e| GatewayError::Io {
            path: file.to_path_buf(),
            source: e,
        })?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let content_type = mime_guess::from_path(file)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let body = HttpBody::Multipart(MultipartFile {
            field: IMAGE_FIELD.to_string(),
            file_name,
            content_type,
            bytes,
        });
        let response = self
            .send(
                HttpMethod::Post,
                self.url(&format!("education/{kind}/{id}/image")),
                Some(token),
                body,
            )
            .await?;

        if response.is_success() {
            Ok(())
        } else {
            Err(Self::api_error(&response))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockTransport;

    const BASE: &str = "http://seed.test/api/v1";

    fn response(status: u16, body: impl AsRef<[u8]>) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_ref().to_vec(),
        }
    }

    fn client(transport: &MockTransport) -> CortexClient {
        CortexClient::new_with_transport(BASE, Arc::new(transport.clone()))
    }

    fn token() -> AuthToken {
        AuthToken::new("tok")
    }

    fn json_body(request: &HttpRequest) -> Value {
        match &request.body {
            HttpBody::Json(bytes) => serde_json::from_slice(bytes).unwrap(),
            other => panic!("expected json body, got {other:?}"),
        }
    }

    #[test]
    fn test_new_normalizes_base_url() {
        let transport = MockTransport::new();
        let client =
            CortexClient::new_with_transport("http://seed.test/api/v1//", Arc::new(transport));
        assert_eq!(client.base_url(), "http://seed.test/api/v1");
    }

    #[test]
    fn test_cortex_client_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<CortexClient>();
    }

    #[tokio::test]
    async fn test_authenticate_returns_token() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            format!("{BASE}/auth/authenticate"),
            response(200, r#"{"token":"abc123"}"#),
        );

        let token = client(&transport)
            .authenticate("admin", "secret")
            .await
            .unwrap();
        assert_eq!(token.as_str(), "abc123");

        let requests = transport.requests();
        let body = json_body(&requests[0]);
        assert_eq!(body["username"], "admin");
        assert_eq!(body["password"], "secret");
        assert!(
            !requests[0]
                .headers
                .iter()
                .any(|(k, _)| k.eq_ignore_ascii_case("authorization"))
        );
    }

    #[tokio::test]
    async fn test_authenticate_without_token_is_auth_error() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            format!("{BASE}/auth/authenticate"),
            response(200, "{}"),
        );

        let err = client(&transport)
            .authenticate("admin", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }

    #[tokio::test]
    async fn test_authenticate_rejected_credentials() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            format!("{BASE}/auth/authenticate"),
            response(403, ""),
        );

        let err = client(&transport)
            .authenticate("admin", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }

    #[tokio::test]
    async fn test_list_uses_kind_endpoints_and_bearer_token() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Get,
            format!("{BASE}/education/course"),
            response(
                200,
                r#"[{"id":1,"name":"Algorithms"},{"id":2},{"name":"no id"}]"#,
            ),
        );

        let listed = client(&transport)
            .list(ResourceKind::Course, &token())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], RemoteResource::new(ResourceKind::Course, 1, "Algorithms"));
        assert!(listed[1].natural_key.is_none());

        let requests = transport.requests();
        assert_eq!(
            crate::http::header_get(&requests[0].headers, "authorization"),
            Some("Bearer tok")
        );
    }

    #[tokio::test]
    async fn test_list_users_hits_user_all() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Get,
            format!("{BASE}/user/all"),
            response(200, r#"[{"id":5,"username":"linlee"}]"#),
        );

        let listed = client(&transport)
            .list(ResourceKind::User, &token())
            .await
            .unwrap();
        assert_eq!(listed[0].natural_key.as_deref(), Some("linlee"));
    }

    #[tokio::test]
    async fn test_list_error_status_is_api_error() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Get,
            format!("{BASE}/education/roadmap"),
            response(500, "boom"),
        );

        let err = client(&transport)
            .list(ResourceKind::Roadmap, &token())
            .await
            .unwrap_err();
        match err {
            GatewayError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_maps_status_codes() {
        let transport = MockTransport::new();
        let url = format!("{BASE}/education/module");
        transport.push_response(
            HttpMethod::Post,
            url.clone(),
            response(201, r#"{"id":7,"name":"Sorting","course_id":1}"#),
        );
        transport.push_response(HttpMethod::Post, url.clone(), response(409, "exists"));
        transport.push_response(HttpMethod::Post, url.clone(), response(200, ""));
        transport.push_response(HttpMethod::Post, url, response(400, "bad"));

        let client = client(&transport);
        let payload = serde_json::json!({"name": "Sorting", "course_id": 1});

        let created = client
            .create(ResourceKind::Module, &token(), &payload)
            .await
            .unwrap();
        assert_eq!(
            created,
            CreateOutcome::Created(RemoteResource::new(ResourceKind::Module, 7, "Sorting"))
        );
        assert_eq!(
            client
                .create(ResourceKind::Module, &token(), &payload)
                .await
                .unwrap(),
            CreateOutcome::Conflict
        );
        assert_eq!(
            client
                .create(ResourceKind::Module, &token(), &payload)
                .await
                .unwrap(),
            CreateOutcome::Accepted
        );
        assert!(matches!(
            client
                .create(ResourceKind::Module, &token(), &payload)
                .await
                .unwrap_err(),
            GatewayError::Api { status: 400, .. }
        ));

        assert_eq!(json_body(&transport.requests()[0])["course_id"], 1);
    }

    #[tokio::test]
    async fn test_register_is_accepted_on_202() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            format!("{BASE}/auth/register"),
            response(202, ""),
        );

        let account = Account {
            firstname: "Lin".into(),
            lastname: "Lee".into(),
            username: "linlee".into(),
            email: "lin@cortex.test".into(),
            password: "password123".into(),
            date_of_birth: None,
            country_code: Some("ES".into()),
            gender: None,
        };

        let outcome = client(&transport).register(&account).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Accepted);
        assert_eq!(json_body(&transport.requests()[0])["countryCode"], "ES");
    }

    #[tokio::test]
    async fn test_activate_account_encodes_token() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Get,
            format!("{BASE}/auth/activate-account?token=a+b%26c"),
            response(200, ""),
        );

        client(&transport).activate_account("a b&c").await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_asset_sends_multipart_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("algorithms.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            format!("{BASE}/education/course/1/image"),
            response(200, ""),
        );

        client(&transport)
            .upload_asset(ResourceKind::Course, ResourceId(1), &token(), &path)
            .await
            .unwrap();

        match &transport.requests()[0].body {
            HttpBody::Multipart(file) => {
                assert_eq!(file.field, "image");
                assert_eq!(file.file_name, "algorithms.png");
                assert_eq!(file.content_type, "image/png");
                assert_eq!(file.bytes, b"\x89PNG");
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_asset_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport = MockTransport::new();

        let err = client(&transport)
            .upload_asset(
                ResourceKind::Course,
                ResourceId(1),
                &token(),
                &dir.path().join("gone.png"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Io { .. }));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_asset_rejects_users() {
        let transport = MockTransport::new();
        let err = client(&transport)
            .upload_asset(
                ResourceKind::User,
                ResourceId(1),
                &token(),
                Path::new("x.png"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_error() {
        let transport = MockTransport::new();
        let err = client(&transport)
            .list(ResourceKind::Course, &token())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Http(_)));
    }
}
