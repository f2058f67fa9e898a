use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::warn;

/// Route the user is sent to when the session ends
pub const LOGIN_ROUTE: &str = "/login";

/// Moves the user to the login entry point.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Records login redirects so the front end can act on them (prompt for
/// credentials, print a notice) at its next opportunity.
#[derive(Debug, Default)]
pub struct LoginRedirect {
    pending: AtomicBool,
    redirects: AtomicUsize,
}

impl LoginRedirect {
    /// Whether a redirect happened since the last call; clears the flag.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for LoginRedirect {
    fn redirect_to_login(&self) {
        warn!(route = LOGIN_ROUTE, "Redirecting to login");
        self.redirects.fetch_add(1, Ordering::SeqCst);
        self.pending.store(true, Ordering::SeqCst);
    }
}
