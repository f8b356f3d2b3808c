//! Admin session state
//!
//! The Vaultwarden admin API authenticates with a short-lived `VW_ADMIN`
//! cookie obtained by posting the admin token to `/admin`. [`AdminSession`]
//! owns the token and the cookie currently in use; the client renews the
//! cookie when the server answers 401.

use std::fmt;

use tokio::sync::Mutex;

/// Name of the Vaultwarden admin session cookie
pub const ADMIN_COOKIE_NAME: &str = "VW_ADMIN";

/// Admin credentials plus the cached session cookie
pub struct AdminSession {
    token: String,
    cookie: Mutex<Option<String>>,
}

impl AdminSession {
    /// Creates a session that will log in on first use
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            cookie: Mutex::new(None),
        }
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Returns the cached cookie value, if logged in
    pub async fn cookie(&self) -> Option<String> {
        self.cookie.lock().await.clone()
    }

    pub(crate) async fn store(&self, cookie: String) {
        *self.cookie.lock().await = Some(cookie);
    }

    /// Forgets the cached cookie so the next request logs in again
    pub async fn invalidate(&self) {
        *self.cookie.lock().await = None;
    }
}

impl fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSession")
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Extracts the `VW_ADMIN` value from a `Set-Cookie` header value
pub(crate) fn parse_admin_cookie(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name == ADMIN_COOKIE_NAME && !value.is_empty()).then(|| value.to_string())
}
