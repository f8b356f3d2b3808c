//! Vaultwarden admin API client
//!
//! Typed access to the handful of admin endpoints vwsync needs. Every call
//! carries the `VW_ADMIN` cookie from the shared [`AdminSession`]; a 401
//! triggers one re-login and one retry of the same request.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vwsync_vaultwarden::{AdminSession, VaultwardenClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let session = Arc::new(AdminSession::new("admin-token"));
//! let client = VaultwardenClient::new("https://vault.example.com", session, Duration::from_secs(5))?;
//! let users = client.list_users().await?;
//! println!("{} accounts", users.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{redirect, Client, Method, Response, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use vwsync_core::domain::{AccountId, RemoteAccount};

use crate::session::{parse_admin_cookie, AdminSession, ADMIN_COOKIE_NAME};
use crate::VaultwardenError;

/// HTTP client for the Vaultwarden admin API
pub struct VaultwardenClient {
    client: Client,
    base_url: String,
    session: Arc<AdminSession>,
}

impl VaultwardenClient {
    /// Creates a client for the instance at `base_url`
    ///
    /// Redirects are never followed: a successful admin login answers with
    /// a redirect that carries the session cookie.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be built (TLS backend setup)
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<AdminSession>,
        timeout: Duration,
    ) -> Result<Self, VaultwardenError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the shared admin session
    pub fn session(&self) -> &Arc<AdminSession> {
        &self.session
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Posts the admin token to `/admin` and caches the returned session cookie
    ///
    /// # Errors
    /// [`VaultwardenError::Unauthorized`] if the server does not hand out a
    /// `VW_ADMIN` cookie (usually a wrong token)
    pub async fn login(&self) -> Result<String, VaultwardenError> {
        let url = format!("{}/admin", self.base_url);
        debug!(url = %url, "Logging in to Vaultwarden admin");

        let response = self
            .client
            .post(&url)
            .form(&[("token", self.session.token())])
            .send()
            .await?;

        let status = response.status();
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(parse_admin_cookie);

        match cookie {
            Some(cookie) if status.is_success() || status.is_redirection() => {
                self.session.store(cookie.clone()).await;
                info!("Vaultwarden admin session established");
                Ok(cookie)
            }
            _ => {
                warn!(status = status.as_u16(), "Vaultwarden admin login rejected");
                Err(VaultwardenError::Unauthorized(format!(
                    "admin login returned {} without a {} cookie",
                    status.as_u16(),
                    ADMIN_COOKIE_NAME
                )))
            }
        }
    }

    async fn current_cookie(&self) -> Result<String, VaultwardenError> {
        match self.session.cookie().await {
            Some(cookie) => Ok(cookie),
            None => self.login().await,
        }
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        cookie: &str,
    ) -> Result<Response, VaultwardenError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(COOKIE, format!("{ADMIN_COOKIE_NAME}={cookie}"));
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Sends an authenticated request, re-logging in once on 401
    ///
    /// Anything but 200 after that is an error.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, VaultwardenError> {
        let cookie = self.current_cookie().await?;
        let mut response = self.send_once(&method, path, body, &cookie).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            info!(path, "Admin session expired, logging in again");
            self.session.invalidate().await;
            let cookie = self.login().await?;
            response = self.send_once(&method, path, body, &cookie).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(VaultwardenError::Unauthorized(format!(
                    "{path} still unauthorized after re-login"
                )));
            }
        }

        if response.status() != StatusCode::OK {
            return Err(VaultwardenError::UnexpectedStatus {
                path: path.to_string(),
                expected: StatusCode::OK.as_u16(),
                actual: response.status().as_u16(),
            });
        }

        Ok(response)
    }

    // ========================================================================
    // Admin endpoints
    // ========================================================================

    /// Lists all users (`GET /admin/users`)
    pub async fn list_users(&self) -> Result<Vec<RemoteAccount>, VaultwardenError> {
        let body: Value = self
            .send(Method::GET, "/admin/users", None)
            .await?
            .json()
            .await?;

        let users = body.as_array().ok_or_else(|| {
            VaultwardenError::InvalidResponse("/admin/users did not return an array".to_string())
        })?;

        let accounts = users
            .iter()
            .map(parse_user)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = accounts.len(), "Fetched Vaultwarden users");
        Ok(accounts)
    }

    /// Invites `email` (`POST /admin/invite`) and returns the new user's id
    pub async fn invite(&self, email: &str) -> Result<AccountId, VaultwardenError> {
        let body = serde_json::json!({ "email": email });
        let user: Value = self
            .send(Method::POST, "/admin/invite", Some(&body))
            .await?
            .json()
            .await?;

        let fields = lowercase_keys(&user)?;
        let id = string_field(&fields, "id")?;
        AccountId::new(id).map_err(|e| VaultwardenError::InvalidResponse(e.to_string()))
    }

    /// Enables a user (`POST /admin/users/{id}/enable`)
    pub async fn enable(&self, id: &AccountId) -> Result<(), VaultwardenError> {
        self.send(Method::POST, &format!("/admin/users/{id}/enable"), None)
            .await?;
        Ok(())
    }

    /// Disables a user (`POST /admin/users/{id}/disable`)
    pub async fn disable(&self, id: &AccountId) -> Result<(), VaultwardenError> {
        self.send(Method::POST, &format!("/admin/users/{id}/disable"), None)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Response parsing
// ============================================================================

/// Vaultwarden changed the key casing of user objects between releases
/// (`UserEnabled` vs `userEnabled`), so keys are compared lowercased.
fn lowercase_keys(value: &Value) -> Result<Map<String, Value>, VaultwardenError> {
    let object = value.as_object().ok_or_else(|| {
        VaultwardenError::InvalidResponse(format!("expected a user object, got {value}"))
    })?;
    Ok(object
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .collect())
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Result<String, VaultwardenError> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| VaultwardenError::InvalidResponse(format!("user object has no '{key}'")))
}

fn parse_user(value: &Value) -> Result<RemoteAccount, VaultwardenError> {
    let fields = lowercase_keys(value)?;
    let id = string_field(&fields, "id")?;
    let email = string_field(&fields, "email")?;
    let enabled = fields
        .get("userenabled")
        .and_then(Value::as_bool)
        .ok_or_else(|| {
            VaultwardenError::InvalidResponse(format!("user {id} has no boolean 'userEnabled'"))
        })?;

    let id = AccountId::new(id).map_err(|e| VaultwardenError::InvalidResponse(e.to_string()))?;
    Ok(RemoteAccount::new(id, email, enabled))
}
