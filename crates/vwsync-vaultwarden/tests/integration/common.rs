//! Shared test helpers for Vaultwarden admin API integration tests
//!
//! Each helper mounts the necessary mock endpoints on a fresh server.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vwsync_vaultwarden::{AdminSession, VaultwardenClient};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const SESSION_COOKIE: &str = "session-1";

/// Starts a mock server that accepts [`ADMIN_TOKEN`] and answers with
/// a 303 carrying [`SESSION_COOKIE`], and returns a client pointing at it.
pub async fn setup_vaultwarden_mock() -> (MockServer, VaultwardenClient) {
    let server = MockServer::start().await;
    mount_login(&server, SESSION_COOKIE).await;
    let client = client_for(&server, ADMIN_TOKEN);
    (server, client)
}

pub fn client_for(server: &MockServer, token: &str) -> VaultwardenClient {
    VaultwardenClient::new(
        server.uri(),
        Arc::new(AdminSession::new(token)),
        Duration::from_secs(2),
    )
    .expect("build client")
}

/// Mounts a successful `POST /admin` login handing out `cookie`
pub async fn mount_login(server: &MockServer, cookie: &str) {
    Mock::given(method("POST"))
        .and(path("/admin"))
        .and(body_string_contains(format!("token={ADMIN_TOKEN}")))
        .respond_with(
            ResponseTemplate::new(303)
                .insert_header("Location", "/admin")
                .insert_header(
                    "Set-Cookie",
                    format!("VW_ADMIN={cookie}; Path=/admin; HttpOnly; SameSite=Strict").as_str(),
                ),
        )
        .mount(server)
        .await;
}

/// Mounts `GET /admin/users` answering `users` for requests carrying `cookie`
pub async fn mount_users(server: &MockServer, cookie: &str, users: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(header("Cookie", format!("VW_ADMIN={cookie}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(users))
        .mount(server)
        .await;
}

pub fn sample_users() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "11111111-1111-1111-1111-111111111111",
            "email": "alice@example.com",
            "name": "Alice",
            "userEnabled": true,
            "emailVerified": true
        },
        {
            "id": "22222222-2222-2222-2222-222222222222",
            "email": "bob@example.com",
            "name": "Bob",
            "userEnabled": false,
            "emailVerified": false
        }
    ])
}
