//! Test doubles shared by the client and store tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::api::{ApiClient, HttpTransport, OutgoingRequest, RawResponse, TransportError};
use crate::auth::{LoginRedirect, MemoryTokenStore};

type Responder = Box<dyn Fn(&OutgoingRequest) -> Result<RawResponse, TransportError> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<Result<RawResponse, TransportError>>>),
    Routed(Responder),
}

/// Transport that records every request and answers from a script.
pub struct FakeTransport {
    script: Script,
    requests: Mutex<Vec<OutgoingRequest>>,
}

impl FakeTransport {
    /// Answer requests in order; an exhausted queue is a connection failure.
    pub fn scripted(responses: Vec<Result<RawResponse, TransportError>>) -> Self {
        Self {
            script: Script::Queue(Mutex::new(responses.into())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer each request with a closure of the request.
    pub fn routed<F>(responder: F) -> Self
    where
        F: Fn(&OutgoingRequest) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            script: Script::Routed(Box::new(responder)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().expect("requests lock").push(request.clone());
        // Let concurrently joined requests interleave like real I/O would
        tokio::task::yield_now().await;
        match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .expect("queue lock")
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connection("no scripted response".to_string()))),
            Script::Routed(responder) => responder(&request),
        }
    }
}

pub fn json_response(status: u16, body: Value) -> RawResponse {
    RawResponse::new(
        StatusCode::from_u16(status).expect("valid status"),
        body.to_string(),
    )
}

/// A client wired to fakes, with handles to inspect each of them.
pub struct TestSession {
    pub client: Arc<ApiClient>,
    pub transport: Arc<FakeTransport>,
    pub tokens: Arc<MemoryTokenStore>,
    pub navigator: Arc<LoginRedirect>,
}

impl TestSession {
    pub fn new(token: Option<&str>, transport: FakeTransport) -> Self {
        let transport = Arc::new(transport);
        let tokens = Arc::new(match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::default(),
        });
        let navigator = Arc::new(LoginRedirect::default());
        let client = Arc::new(ApiClient::new(
            "http://localhost:5000",
            transport.clone(),
            tokens.clone(),
            navigator.clone(),
        ));
        Self {
            client,
            transport,
            tokens,
            navigator,
        }
    }

    pub fn with_responses(token: Option<&str>, responses: Vec<Result<RawResponse, TransportError>>) -> Self {
        Self::new(token, FakeTransport::scripted(responses))
    }
}
