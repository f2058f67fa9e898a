//! Session-aware API client for the expense tracker REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests. The client owns the access token: it attaches it to every
//! request, refreshes it once when the server reports expiry, and ends the
//! session when recovery is impossible.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{Navigator, PersistentCookieJar, TokenStore};
use crate::config::Config;
use crate::models::{CategoryInput, Credentials, Registration, TransactionFilters, TransactionInput, TransactionType};

use super::transport::{HttpTransport, OutgoingRequest, RawResponse, ReqwestTransport};
use super::{Envelope, QueryParams, TransportError};

// ============================================================================
// Constants
// ============================================================================

/// Path prefix prepended to every endpoint
pub const API_BASE_PATH: &str = "/api";

/// Error code in a 401 body that marks an expired (refreshable) access token
pub const TOKEN_EXPIRED_CODE: &str = "TOKEN_EXPIRED";

/// Endpoint that trades the refresh cookie for a new access token
const REFRESH_PATH: &str = "/auth/refresh";

/// Cookie jar file name in the cache directory
const COOKIE_FILE: &str = "cookies.json";

// ============================================================================
// Request descriptor
// ============================================================================

/// Method, path, query, JSON body and extra headers for one call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub body: Option<Vec<u8>>,
    pub headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Extra header; overrides the default `Content-Type` on conflict.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the expense tracker.
///
/// Construct once at startup and share it (`Arc<ApiClient>`); it is the only
/// owner of the access token.
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    cookies: Option<Arc<PersistentCookieJar>>,
    token: RwLock<Option<String>>,
    /// Held while refreshing so concurrent expiries share one refresh
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Create a client; the persisted token, if any, is read once here.
    pub fn new(
        server_url: &str,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let token = match tokens.get_token() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session token");
                None
            }
        };
        debug!(rehydrated = token.is_some(), "API client created");

        Self {
            base_url: format!("{}{}", server_url.trim_end_matches('/'), API_BASE_PATH),
            transport,
            tokens,
            navigator,
            cookies: None,
            token: RwLock::new(token),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Build the production client: reqwest transport with a persisted
    /// cookie jar and the configured token store.
    pub fn from_config(config: &Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        let cookies = Arc::new(PersistentCookieJar::load(cache_dir.join(COOKIE_FILE)));
        let transport = ReqwestTransport::new(config.request_timeout(), cookies.clone())
            .context("Failed to build HTTP client")?;
        let tokens = config.token_backend.open(&cache_dir);
        Ok(Self::new(&config.server_url(), Arc::new(transport), tokens, navigator).with_cookie_jar(cookies))
    }

    /// Attach the jar the transport stores the refresh cookie in, so a
    /// logout can forget it.
    pub fn with_cookie_jar(mut self, cookies: Arc<PersistentCookieJar>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Drop the persisted refresh cookie, if this client has a jar
    pub fn clear_cookies(&self) {
        if let Some(cookies) = &self.cookies {
            if let Err(e) = cookies.clear() {
                warn!(error = %e, "Failed to clear persisted cookies");
            }
        }
    }

    /// Current access token
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the access token and persist the change. `None` (or an empty
    /// string) clears it. No network activity.
    pub fn set_token(&self, token: Option<&str>) {
        let token = token.filter(|t| !t.is_empty());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token.map(str::to_string);

        let persisted = match token {
            Some(token) => self.tokens.set_token(token),
            None => self.tokens.clear_token(),
        };
        if let Err(e) = persisted {
            warn!(error = %e, "Failed to persist session token");
        }
    }

    /// Send a request and normalize the outcome. Never fails: transport
    /// errors, API errors and a lost session all come back as an envelope.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Envelope {
        let sent_token = self.token();
        let response = match self.send(&descriptor, sent_token.as_deref()).await {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %descriptor.method, path = %descriptor.path, error = %e, "API request failed");
                return Envelope::network_error();
            }
        };

        if response.status == reqwest::StatusCode::UNAUTHORIZED {
            if let Some(sent_token) = sent_token {
                return self.recover_session(&descriptor, &sent_token, &response).await;
            }
        }

        Self::normalize(&descriptor, response)
    }

    /// Trade the refresh cookie for a new access token. Returns false on any
    /// failure and leaves state untouched in that case.
    pub async fn refresh_token(&self) -> bool {
        let request = match self.outgoing(&RequestDescriptor::post(REFRESH_PATH), None, false) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return false;
            }
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return false;
            }
        };

        if !response.status.is_success() {
            debug!(status = %response.status, "Token refresh rejected");
            return false;
        }

        let token = response
            .json_payload()
            .ok()
            .flatten()
            .and_then(|p| p.get("accessToken").and_then(Value::as_str).map(str::to_string))
            .filter(|t| !t.is_empty());

        match token {
            Some(token) => {
                self.set_token(Some(&token));
                info!("Access token refreshed");
                true
            }
            None => {
                warn!("Token refresh response carried no access token");
                false
            }
        }
    }

    async fn recover_session(
        &self,
        descriptor: &RequestDescriptor,
        sent_token: &str,
        response: &RawResponse,
    ) -> Envelope {
        if Self::is_token_expired(response) && self.refresh_after_expiry(sent_token).await {
            let token = self.token();
            return match self.send(descriptor, token.as_deref()).await {
                Ok(retry) => Self::normalize(descriptor, retry),
                Err(e) => {
                    warn!(path = %descriptor.path, error = %e, "Retry after token refresh failed");
                    Envelope::network_error()
                }
            };
        }

        self.end_session();
        Envelope::unauthorized()
    }

    /// Single-flight refresh: a caller whose token was already replaced by a
    /// concurrent refresh reuses that result instead of refreshing again.
    async fn refresh_after_expiry(&self, sent_token: &str) -> bool {
        let _guard = self.refresh_lock.lock().await;
        match self.token() {
            Some(current) if current != sent_token => {
                debug!("Token already refreshed by a concurrent request");
                true
            }
            Some(_) => self.refresh_token().await,
            None => false,
        }
    }

    fn end_session(&self) {
        warn!("Session could not be recovered, login required");
        self.set_token(None);
        self.navigator.redirect_to_login();
    }

    fn is_token_expired(response: &RawResponse) -> bool {
        response
            .json_payload()
            .ok()
            .flatten()
            .and_then(|p| p.get("code").and_then(Value::as_str).map(|c| c == TOKEN_EXPIRED_CODE))
            .unwrap_or(false)
    }

    fn normalize(descriptor: &RequestDescriptor, response: RawResponse) -> Envelope {
        let status = response.status.as_u16();
        debug!(method = %descriptor.method, path = %descriptor.path, status, "API response");
        match response.json_payload() {
            Ok(payload) => Envelope::from_response(status, payload),
            Err(e) if response.status.is_success() => {
                warn!(path = %descriptor.path, error = %e, "Failed to parse JSON response");
                Envelope::invalid_response(status, "Invalid response from server")
            }
            Err(_) => Envelope::from_response(status, None),
        }
    }

    async fn send(&self, descriptor: &RequestDescriptor, token: Option<&str>) -> Result<RawResponse, TransportError> {
        let request = self.outgoing(descriptor, token, true)?;
        self.transport.send(request).await
    }

    fn outgoing(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
        json: bool,
    ) -> Result<OutgoingRequest, TransportError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, descriptor.path))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", descriptor.path, e)))?;
        if !descriptor.query.is_empty() {
            url.query_pairs_mut().extend_pairs(descriptor.query.pairs());
        }

        let mut headers = HeaderMap::new();
        if json {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        for (name, value) in &descriptor.headers {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| TransportError::InvalidHeader(e.to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        Ok(OutgoingRequest {
            method: descriptor.method.clone(),
            url,
            headers,
            body: descriptor.body.clone(),
        })
    }

    async fn send_json<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> Envelope {
        match RequestDescriptor::new(method, path).with_json(body) {
            Ok(descriptor) => self.request(descriptor).await,
            Err(e) => Envelope::failure(format!("Invalid request body: {}", e)),
        }
    }

    // ===== Auth =====

    pub async fn register(&self, registration: &Registration) -> Envelope {
        self.send_json(Method::POST, "/auth/register", registration).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Envelope {
        self.send_json(Method::POST, "/auth/login", credentials).await
    }

    /// Log out on the server; the local token is cleared whatever the outcome.
    pub async fn logout(&self) -> Envelope {
        let result = self.request(RequestDescriptor::post("/auth/logout")).await;
        self.set_token(None);
        result
    }

    pub async fn forgot_password(&self, email: &str) -> Envelope {
        self.send_json(Method::POST, "/auth/forgot-password", &json!({ "email": email }))
            .await
    }

    pub async fn get_current_user(&self) -> Envelope {
        self.request(RequestDescriptor::get("/auth/me")).await
    }

    // ===== Transactions =====

    pub async fn get_transactions(&self, filters: &TransactionFilters) -> Envelope {
        self.request(RequestDescriptor::get("/transactions").with_query(filters.query()))
            .await
    }

    pub async fn get_transaction(&self, id: &str) -> Envelope {
        self.request(RequestDescriptor::get(format!("/transactions/{}", id)))
            .await
    }

    pub async fn create_transaction(&self, input: &TransactionInput) -> Envelope {
        self.send_json(Method::POST, "/transactions", input).await
    }

    pub async fn update_transaction(&self, id: &str, input: &TransactionInput) -> Envelope {
        self.send_json(Method::PUT, &format!("/transactions/{}", id), input)
            .await
    }

    pub async fn delete_transaction(&self, id: &str) -> Envelope {
        self.request(RequestDescriptor::delete(format!("/transactions/{}", id)))
            .await
    }

    pub async fn get_statistics(&self, filters: &TransactionFilters) -> Envelope {
        self.request(RequestDescriptor::get("/transactions/statistics").with_query(filters.query()))
            .await
    }

    pub async fn get_category_breakdown(&self, kind: TransactionType, filters: &TransactionFilters) -> Envelope {
        self.request(
            RequestDescriptor::get(format!("/transactions/categories/{}", kind)).with_query(filters.query()),
        )
        .await
    }

    // ===== Categories =====

    pub async fn get_categories(&self, kind: Option<TransactionType>) -> Envelope {
        let mut query = QueryParams::new();
        query.push_opt("type", kind);
        self.request(RequestDescriptor::get("/categories").with_query(query))
            .await
    }

    pub async fn get_category(&self, id: &str) -> Envelope {
        self.request(RequestDescriptor::get(format!("/categories/{}", id)))
            .await
    }

    pub async fn create_category(&self, input: &CategoryInput) -> Envelope {
        self.send_json(Method::POST, "/categories", input).await
    }

    pub async fn update_category(&self, id: &str, input: &CategoryInput) -> Envelope {
        self.send_json(Method::PUT, &format!("/categories/{}", id), input)
            .await
    }

    pub async fn delete_category(&self, id: &str) -> Envelope {
        self.request(RequestDescriptor::delete(format!("/categories/{}", id)))
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::api::NETWORK_ERROR_MESSAGE;
    use crate::auth::{LoginRedirect, MemoryTokenStore};
    use crate::testing::{json_response, FakeTransport, TestSession};

    fn expired() -> RawResponse {
        json_response(401, json!({"message": "Token expired", "code": TOKEN_EXPIRED_CODE}))
    }

    #[tokio::test]
    async fn test_bearer_header_follows_token() {
        let session = TestSession::with_responses(Some("abc"), vec![
            Ok(json_response(200, json!({"user": {"_id": "u1", "email": "a@b.c"}}))),
            Ok(json_response(200, json!({"categories": []}))),
        ]);

        session.client.get_current_user().await;
        session.client.set_token(None);
        session.client.get_categories(None).await;

        let sent = session.transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].bearer_token(), Some("abc"));
        assert!(sent[1].headers.get(header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_request_building() {
        let session = TestSession::with_responses(None, vec![Ok(json_response(201, json!({"category": {}})))]);
        let descriptor = RequestDescriptor::post("/categories")
            .with_json(&json!({"name": "Food"}))
            .expect("serializable")
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/vnd.api+json"))
            .with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("1"));

        let envelope = session.client.request(descriptor).await;
        assert!(envelope.success);

        let sent = &session.transport.requests()[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url.as_str(), "http://localhost:5000/api/categories");
        assert_eq!(sent.headers[header::CONTENT_TYPE], "application/vnd.api+json");
        assert_eq!(sent.headers["x-trace"], "1");
        assert_eq!(sent.body.as_deref(), Some(br#"{"name":"Food"}"#.as_slice()));
    }

    #[tokio::test]
    async fn test_filters_become_query_parameters() {
        let session = TestSession::with_responses(None, vec![Ok(json_response(200, json!({"transactions": []})))]);
        let filters = TransactionFilters {
            kind: Some(TransactionType::Income),
            category: Some(String::new()),
            ..TransactionFilters::default()
        };
        session.client.get_transactions(&filters).await;
        assert_eq!(
            session.transport.requests()[0].url.as_str(),
            "http://localhost:5000/api/transactions?type=income"
        );
    }

    #[tokio::test]
    async fn test_no_query_string_without_filters() {
        let session = TestSession::with_responses(None, vec![Ok(json_response(200, json!({"transactions": []})))]);
        session.client.get_transactions(&TransactionFilters::default()).await;
        assert_eq!(
            session.transport.requests()[0].url.as_str(),
            "http://localhost:5000/api/transactions"
        );
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_and_retries_once() {
        let session = TestSession::with_responses(Some("old"), vec![
            Ok(expired()),
            Ok(json_response(200, json!({"accessToken": "new"}))),
            Ok(json_response(200, json!({"transactions": [], "total": 0}))),
        ]);

        let envelope = session.client.get_transactions(&TransactionFilters::default()).await;

        let sent = session.transport.requests();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].bearer_token(), Some("old"));
        assert_eq!(sent[1].url.path(), "/api/auth/refresh");
        assert!(sent[1].body.is_none());
        assert!(sent[1].headers.get(header::AUTHORIZATION).is_none());
        assert_eq!(sent[2].url.path(), "/api/transactions");
        assert_eq!(sent[2].bearer_token(), Some("new"));

        assert_eq!(envelope, Envelope::from_response(200, Some(json!({"transactions": [], "total": 0}))));
        assert_eq!(session.client.token().as_deref(), Some("new"));
        assert_eq!(session.tokens.get_token().expect("memory store"), Some("new".to_string()));
        assert_eq!(session.navigator.redirect_count(), 0);
    }

    #[tokio::test]
    async fn test_retry_is_not_repeated() {
        let session = TestSession::with_responses(Some("old"), vec![
            Ok(expired()),
            Ok(json_response(200, json!({"accessToken": "new"}))),
            Ok(expired()),
        ]);

        let envelope = session.client.get_current_user().await;

        assert_eq!(session.transport.requests().len(), 3);
        assert!(!envelope.success);
        assert_eq!(envelope.status, Some(401));
        assert_eq!(envelope.message.as_deref(), Some("Token expired"));
    }

    #[tokio::test]
    async fn test_failed_refresh_ends_session() {
        let session = TestSession::with_responses(Some("old"), vec![
            Ok(expired()),
            Ok(json_response(401, json!({"message": "Invalid refresh token"}))),
        ]);

        let envelope = session.client.get_categories(None).await;

        assert_eq!(session.transport.requests().len(), 2);
        assert_eq!(envelope, Envelope::unauthorized());
        assert_eq!(envelope.message.as_deref(), Some("Unauthorized"));
        assert!(session.client.token().is_none());
        assert_eq!(session.tokens.get_token().expect("memory store"), None);
        assert_eq!(session.navigator.redirect_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_transport_failure_ends_session() {
        let session = TestSession::with_responses(Some("old"), vec![
            Ok(expired()),
            Err(TransportError::Connection("refused".to_string())),
        ]);

        let envelope = session.client.get_categories(None).await;

        assert_eq!(envelope, Envelope::unauthorized());
        assert_eq!(session.navigator.redirect_count(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_without_marker_skips_refresh() {
        let session = TestSession::with_responses(Some("revoked"), vec![Ok(json_response(
            401,
            json!({"message": "Invalid token", "code": "INVALID_TOKEN"}),
        ))]);

        let envelope = session.client.get_current_user().await;

        let sent = session.transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(envelope, Envelope::unauthorized());
        assert!(session.client.token().is_none());
        assert_eq!(session.navigator.redirect_count(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_without_token_is_plain_failure() {
        let session = TestSession::with_responses(None, vec![Ok(json_response(
            401,
            json!({"message": "Invalid credentials"}),
        ))]);

        let credentials = Credentials {
            email: "a@b.c".to_string(),
            password: "wrong".to_string(),
        };
        let envelope = session.client.login(&credentials).await;

        assert_eq!(session.transport.requests().len(), 1);
        assert_eq!(envelope, Envelope::http_failure(401, "Invalid credentials"));
        assert_eq!(session.navigator.redirect_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_success_body() {
        let session = TestSession::with_responses(Some("abc"), vec![Ok(RawResponse::new(StatusCode::NO_CONTENT, ""))]);
        let envelope = session.client.delete_transaction("t1").await;
        assert_eq!(envelope, Envelope::ok(serde_json::Map::new()));
        assert_eq!(session.transport.requests()[0].method, Method::DELETE);
        assert_eq!(session.transport.requests()[0].url.path(), "/api/transactions/t1");
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let session = TestSession::with_responses(Some("abc"), vec![Err(TransportError::Connection(
            "connection refused".to_string(),
        ))]);
        let envelope = session.client.get_statistics(&TransactionFilters::default()).await;
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some(NETWORK_ERROR_MESSAGE));
        assert_eq!(session.client.token().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let session = TestSession::with_responses(None, vec![Ok(RawResponse::new(StatusCode::OK, "<html>"))]);
        let envelope = session.client.get_categories(None).await;
        assert!(!envelope.success);
        assert_eq!(envelope.status, Some(200));
    }

    #[tokio::test]
    async fn test_set_token_none_is_idempotent() {
        let session = TestSession::with_responses(Some("abc"), vec![]);
        for _ in 0..2 {
            session.client.set_token(None);
            assert!(session.client.token().is_none());
            assert_eq!(session.tokens.get_token().expect("memory store"), None);
        }
        assert!(session.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_set_token_persists() {
        let session = TestSession::with_responses(None, vec![]);
        session.client.set_token(Some("t1"));
        assert_eq!(session.tokens.get_token().expect("memory store"), Some("t1".to_string()));
        session.client.set_token(Some(""));
        assert!(!session.client.has_token());
    }

    #[tokio::test]
    async fn test_token_rehydrated_at_construction() {
        let tokens = Arc::new(MemoryTokenStore::with_token("persisted"));
        let transport = Arc::new(FakeTransport::scripted(vec![Ok(json_response(200, json!({})))]));
        let client = ApiClient::new(
            "http://localhost:5000/",
            transport.clone(),
            tokens,
            Arc::new(LoginRedirect::default()),
        );
        client.get_current_user().await;
        assert_eq!(transport.requests()[0].bearer_token(), Some("persisted"));
        assert_eq!(transport.requests()[0].url.as_str(), "http://localhost:5000/api/auth/me");
    }

    #[tokio::test]
    async fn test_logout_clears_token_even_on_failure() {
        let session = TestSession::with_responses(Some("abc"), vec![Ok(json_response(500, json!({})))]);
        let envelope = session.client.logout().await;
        assert!(!envelope.success);
        assert!(session.client.token().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_expiry_refreshes_once() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = refreshes.clone();
        let transport = Arc::new(FakeTransport::routed(move |request| {
            if request.url.path() == "/api/auth/refresh" {
                counter.fetch_add(1, Ordering::SeqCst);
                return Ok(json_response(200, json!({"accessToken": "fresh"})));
            }
            match request.bearer_token() {
                Some("fresh") => Ok(json_response(200, json!({"ok": true}))),
                _ => Ok(json_response(401, json!({"code": TOKEN_EXPIRED_CODE}))),
            }
        }));
        let navigator = Arc::new(LoginRedirect::default());
        let client = ApiClient::new(
            "http://localhost:5000",
            transport.clone(),
            Arc::new(MemoryTokenStore::with_token("stale")),
            navigator.clone(),
        );

        let (a, b) = tokio::join!(client.get_current_user(), client.get_categories(None));

        assert!(a.success);
        assert!(b.success);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(navigator.redirect_count(), 0);
        assert_eq!(transport.requests().len(), 5);
    }
}
