use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::ApiError;

/// Message returned when no response was received at all
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Message returned when the session could not be recovered
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Where a failure came from. Not part of the wire shape; lets
/// [`ApiError::from_envelope`] classify without matching on message text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureOrigin {
    #[default]
    Response,
    Transport,
    SessionEnded,
    Decode,
}

/// Normalized result of every API call: `{ success, message?, status?, ...fields }`.
///
/// For a 2xx response the body's top-level fields are spread into `data`
/// (a body `success`, `message` or `status` overrides the defaults, as the
/// server intends). A non-object body is kept under `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
    #[serde(skip)]
    pub(crate) origin: FailureOrigin,
}

impl Envelope {
    pub fn ok(data: Map<String, Value>) -> Self {
        Self {
            success: true,
            message: None,
            status: None,
            data,
            origin: FailureOrigin::Response,
        }
    }

    /// A failure reported by the API without an HTTP status
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            status: None,
            data: Map::new(),
            origin: FailureOrigin::Response,
        }
    }

    pub fn http_failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::failure(message)
        }
    }

    pub fn network_error() -> Self {
        Self {
            origin: FailureOrigin::Transport,
            ..Self::failure(NETWORK_ERROR_MESSAGE)
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            origin: FailureOrigin::SessionEnded,
            ..Self::failure(UNAUTHORIZED_MESSAGE)
        }
    }

    pub fn invalid_response(status: u16, detail: impl Into<String>) -> Self {
        Self {
            origin: FailureOrigin::Decode,
            ..Self::http_failure(status, detail)
        }
    }

    /// Normalize a received response. `payload` is `None` for an empty body.
    pub fn from_response(status: u16, payload: Option<Value>) -> Self {
        if !(200..300).contains(&status) {
            let message = payload
                .as_ref()
                .and_then(|p| p.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status));
            return Self::http_failure(status, message);
        }

        let mut data = match payload {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };

        let mut envelope = Self::ok(Map::new());
        if let Some(success) = data.get("success").and_then(Value::as_bool) {
            envelope.success = success;
            data.remove("success");
        }
        if let Some(message) = data.get("message").and_then(Value::as_str) {
            envelope.message = Some(message.to_string());
            data.remove("message");
        }
        if let Some(status) = data
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
        {
            envelope.status = Some(status);
            data.remove("status");
        }
        envelope.data = data;
        envelope
    }

    pub fn message_or_default(&self) -> String {
        self.message.clone().unwrap_or_else(|| {
            if self.success {
                String::new()
            } else {
                "Request failed".to_string()
            }
        })
    }

    /// Failed envelopes become a classified [`ApiError`].
    pub fn into_result(self) -> Result<Self, ApiError> {
        match ApiError::from_envelope(&self) {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Deserialize a required domain field, e.g. `transactions`.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Result<T, ApiError> {
        self.optional_field(key)?
            .ok_or_else(|| ApiError::InvalidResponse(format!("missing field '{}'", key)))
    }

    /// Deserialize a domain field that may be absent or null.
    pub fn optional_field<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ApiError> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|e| ApiError::InvalidResponse(format!("field '{}': {}", key, e))),
        }
    }
}
