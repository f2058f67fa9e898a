//! Session-aware REST client for the expense tracker API.
//!
//! `ApiClient` owns the bearer token, attaches it to every request, and
//! recovers from an expired access token with a single refresh-and-retry.
//! Every call resolves to an [`Envelope`], so transport failures and API
//! failures reach callers in the same shape.
//!
//! The HTTP layer sits behind [`HttpTransport`]; production code uses
//! [`ReqwestTransport`], tests script responses.

pub mod client;
pub mod envelope;
pub mod error;
pub mod query;
pub mod transport;

pub use client::{ApiClient, RequestDescriptor, API_BASE_PATH, TOKEN_EXPIRED_CODE};
pub use envelope::{Envelope, NETWORK_ERROR_MESSAGE, UNAUTHORIZED_MESSAGE};
pub use error::{ApiError, TransportError};
pub use query::QueryParams;
pub use transport::{HttpTransport, OutgoingRequest, RawResponse, ReqwestTransport};
