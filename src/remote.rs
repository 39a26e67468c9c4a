//! HTTP/JSON client for the REST collaborator (reqwest).
//!
//! Every request carries `Authorization: Bearer <token>` once a session
//! exists. A 401 on an endpoint inside the configured `LogoutScope` clears the
//! session and surfaces as `ApiError::AuthorizationExpired`. Login and
//! register are exempt so a rejected login leaves the session untouched.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::catalog::SweetFilter;
use crate::config::{Config, LogoutScope};
use crate::errors::ApiError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, Sweet, SweetDraft};
use crate::session::SessionState;

/// Remote half of the auth gateway
#[async_trait]
pub trait RemoteAuth: Send + Sync {
    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ApiError>;
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError>;
}

/// Remote half of the catalog service
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    async fn list_sweets(&self) -> Result<Vec<Sweet>, ApiError>;
    async fn search_sweets(&self, filter: &SweetFilter) -> Result<Vec<Sweet>, ApiError>;
    async fn get_sweet(&self, id: u64) -> Result<Sweet, ApiError>;
    async fn create_sweet(&self, draft: &SweetDraft) -> Result<CreatedSweet, ApiError>;
    async fn update_sweet(&self, id: u64, draft: &SweetDraft) -> Result<serde_json::Value, ApiError>;
    async fn delete_sweet(&self, id: u64) -> Result<serde_json::Value, ApiError>;
    async fn purchase_sweet(&self, id: u64, quantity: u32) -> Result<serde_json::Value, ApiError>;
    async fn restock_sweet(&self, id: u64, quantity: u32) -> Result<serde_json::Value, ApiError>;
}

/// Only the id of a created sweet matters to the client
#[derive(Deserialize, Debug, Clone)]
pub struct CreatedSweet {
    pub id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndpointKind {
    /// login, register
    Credentials,
    /// catalog reads
    Public,
    /// purchase and admin mutations
    Protected,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionState,
    logout_scope: LogoutScope,
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionState) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
            logout_scope: config.logout_scope,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn clears_session_on_401(&self, kind: EndpointKind) -> bool {
        match (kind, self.logout_scope) {
            (EndpointKind::Credentials, _) => false,
            (EndpointKind::Public, LogoutScope::ProtectedEndpointsOnly) => false,
            _ => true,
        }
    }

    /// Attach the bearer token, send, and apply the 401 interceptor
    async fn send<T: DeserializeOwned>(&self, kind: EndpointKind, request: RequestBuilder) -> Result<T, ApiError> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        debug!("remote responded {} for {}", status, response.url());

        if status == StatusCode::UNAUTHORIZED && self.clears_session_on_401(kind) {
            warn!("remote rejected credentials; clearing session");
            if let Err(e) = self.session.clear() {
                warn!("failed to clear session after 401: {}", e);
            }
            return Err(ApiError::AuthorizationExpired);
        }

        let raw = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&raw, status),
            });
        }

        // Empty bodies (e.g. DELETE) decode as JSON null
        let body: &[u8] = if raw.is_empty() { b"null" } else { &raw };
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// `{"message": ...}` from the body when present, otherwise `Error: <status>`
fn error_message(body: &[u8], status: StatusCode) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("Error: {}", status.as_u16()))
}

fn search_params(filter: &SweetFilter) -> Vec<(&'static str, String)> {
    let mut params = vec![];
    if let Some(name) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        params.push(("name", name.to_string()));
    }
    if let Some(category) = filter.selected_category() {
        params.push(("category", category.to_string()));
    }
    if let Some(min) = filter.min_price {
        params.push(("minPrice", min.to_string()));
    }
    if let Some(max) = filter.max_price {
        params.push(("maxPrice", max.to_string()));
    }
    params
}

#[async_trait]
impl RemoteAuth for ApiClient {
    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let request = self.http.post(self.url("/auth/register")).json(req);
        self.send(EndpointKind::Credentials, request).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let request = self.http.post(self.url("/auth/login")).json(req);
        self.send(EndpointKind::Credentials, request).await
    }
}

#[async_trait]
impl RemoteCatalog for ApiClient {
    async fn list_sweets(&self) -> Result<Vec<Sweet>, ApiError> {
        self.send(EndpointKind::Public, self.http.get(self.url("/sweets"))).await
    }

    async fn search_sweets(&self, filter: &SweetFilter) -> Result<Vec<Sweet>, ApiError> {
        let request = self.http.get(self.url("/sweets/search")).query(&search_params(filter));
        self.send(EndpointKind::Public, request).await
    }

    async fn get_sweet(&self, id: u64) -> Result<Sweet, ApiError> {
        let request = self.http.get(self.url(&format!("/sweets/{}", id)));
        self.send(EndpointKind::Public, request).await
    }

    async fn create_sweet(&self, draft: &SweetDraft) -> Result<CreatedSweet, ApiError> {
        let request = self.http.post(self.url("/sweets")).json(draft);
        self.send(EndpointKind::Protected, request).await
    }

    async fn update_sweet(&self, id: u64, draft: &SweetDraft) -> Result<serde_json::Value, ApiError> {
        let request = self.http.put(self.url(&format!("/sweets/{}", id))).json(draft);
        self.send(EndpointKind::Protected, request).await
    }

    async fn delete_sweet(&self, id: u64) -> Result<serde_json::Value, ApiError> {
        let request = self.http.delete(self.url(&format!("/sweets/{}", id)));
        self.send(EndpointKind::Protected, request).await
    }

    async fn purchase_sweet(&self, id: u64, quantity: u32) -> Result<serde_json::Value, ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/sweets/{}/purchase", id)))
            .json(&json!({ "quantity": quantity }));
        self.send(EndpointKind::Protected, request).await
    }

    async fn restock_sweet(&self, id: u64, quantity: u32) -> Result<serde_json::Value, ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/sweets/{}/restock", id)))
            .json(&json!({ "quantity": quantity }));
        self.send(EndpointKind::Protected, request).await
    }
}
