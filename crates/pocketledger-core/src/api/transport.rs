use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;

use super::TransportError;

/// A fully built request, ready to hand to a transport.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl OutgoingRequest {
    /// The bearer token carried in the `Authorization` header, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// Status and raw body of a received response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Parsed JSON body. An empty (or all-whitespace) body is `Ok(None)`.
    pub fn json_payload(&self) -> Result<Option<Value>, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&self.body).map(Some)
    }
}

/// Sends requests. Cookies are always included so the refresh credential
/// travels with every call.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError>;
}

/// Reqwest-backed transport with a shared cookie store.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new<C: CookieStore + 'static>(timeout: Duration, cookies: Arc<C>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_provider(cookies)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_has_no_payload() {
        assert!(RawResponse::new(StatusCode::OK, "").json_payload().expect("empty").is_none());
        assert!(RawResponse::new(StatusCode::OK, " \n").json_payload().expect("blank").is_none());
    }

    #[test]
    fn test_json_payload() {
        let response = RawResponse::new(StatusCode::UNAUTHORIZED, r#"{"code":"TOKEN_EXPIRED"}"#);
        let payload = response.json_payload().expect("valid JSON").expect("non-empty");
        assert_eq!(payload["code"], "TOKEN_EXPIRED");
        assert!(RawResponse::new(StatusCode::OK, "<html>").json_payload().is_err());
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_static("Bearer abc"),
        );
        let request = OutgoingRequest {
            method: Method::GET,
            url: Url::parse("http://localhost/api/auth/me").expect("valid URL"),
            headers,
            body: None,
        };
        assert_eq!(request.bearer_token(), Some("abc"));
    }
}
