use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, Envelope};
use crate::models::{Credentials, Registration, User};

/// Signed-in user state on top of the shared [`ApiClient`].
pub struct AuthStore {
    client: Arc<ApiClient>,
    user: Option<User>,
    loading: bool,
    error: Option<String>,
}

impl AuthStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            user: None,
            loading: true,
            error: None,
        }
    }

    /// Restore the user behind a persisted token. A token the server
    /// rejects is dropped; an unreachable server leaves it in place. Either
    /// failure is kept in [`AuthStore::error`].
    pub async fn initialize(&mut self) {
        self.error = None;
        if self.client.has_token() {
            let envelope = self.client.get_current_user().await;
            match Self::user_from(&envelope) {
                Ok(user) => {
                    debug!(user = %user.email, "Session restored");
                    self.user = Some(user);
                }
                Err(ApiError::Network(message)) => {
                    warn!(error = %message, "Server unreachable, keeping session token");
                    self.error = Some(message);
                }
                Err(e) => {
                    warn!(error = %e, "Session restore failed");
                    self.client.set_token(None);
                    self.fail(e);
                }
            }
        }
        self.loading = false;
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<User, ApiError> {
        self.error = None;
        let envelope = self.client.login(credentials).await;
        let result = self.start_session(&envelope);
        if let Ok(ref user) = result {
            info!(user = %user.email, "Logged in");
        }
        result
    }

    pub async fn register(&mut self, registration: &Registration) -> Result<User, ApiError> {
        self.error = None;
        let envelope = self.client.register(registration).await;
        let result = self.start_session(&envelope);
        if let Ok(ref user) = result {
            info!(user = %user.email, "Registered");
        }
        result
    }

    /// Log out on the server; local state, including the persisted refresh
    /// cookie, is cleared either way.
    pub async fn logout(&mut self) {
        let envelope = self.client.logout().await;
        if !envelope.success {
            warn!(message = %envelope.message_or_default(), "Logout request failed");
        }
        self.client.set_token(None);
        self.client.clear_cookies();
        self.user = None;
        self.error = None;
    }

    /// Ask the server to send a reset email; returns its message.
    pub async fn forgot_password(&mut self, email: &str) -> Result<String, ApiError> {
        self.error = None;
        let envelope = self.client.forgot_password(email).await;
        match envelope.into_result() {
            Ok(envelope) => Ok(envelope.message_or_default()),
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn start_session(&mut self, envelope: &Envelope) -> Result<User, ApiError> {
        let session = match ApiError::from_envelope(envelope) {
            Some(e) => Err(e),
            None => envelope
                .field::<String>("accessToken")
                .and_then(|token| Ok((token, envelope.field::<User>("user")?))),
        };
        match session {
            Ok((token, user)) => {
                self.client.set_token(Some(&token));
                self.user = Some(user.clone());
                Ok(user)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn user_from(envelope: &Envelope) -> Result<User, ApiError> {
        if let Some(e) = ApiError::from_envelope(envelope) {
            return Err(e);
        }
        envelope.field("user")
    }

    fn fail(&mut self, error: ApiError) -> ApiError {
        self.error = Some(error.to_string());
        error
    }
}
