//! Admin session handling: login, cookie reuse, re-login on 401

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vwsync_vaultwarden::VaultwardenError;

use crate::common::{self, ADMIN_TOKEN, SESSION_COOKIE};

#[tokio::test]
async fn test_login_stores_cookie() {
    let (_server, client) = common::setup_vaultwarden_mock().await;

    let cookie = client.login().await.expect("login failed");

    assert_eq!(cookie, SESSION_COOKIE);
    assert_eq!(client.session().cookie().await.as_deref(), Some(SESSION_COOKIE));
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(401).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;
    let client = common::client_for(&server, "wrong-token");

    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, VaultwardenError::Unauthorized(_)));
}

#[tokio::test]
async fn test_cookie_is_reused_across_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin"))
        .respond_with(
            ResponseTemplate::new(303).insert_header("Set-Cookie", "VW_ADMIN=session-1; Path=/admin"),
        )
        .expect(1)
        .mount(&server)
        .await;
    common::mount_users(&server, SESSION_COOKIE, common::sample_users()).await;
    let client = common::client_for(&server, ADMIN_TOKEN);

    client.list_users().await.unwrap();
    client.list_users().await.unwrap();
}

#[tokio::test]
async fn test_expired_session_triggers_one_relogin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin"))
        .respond_with(
            ResponseTemplate::new(303).insert_header("Set-Cookie", "VW_ADMIN=session-1; Path=/admin"),
        )
        .expect(2)
        .mount(&server)
        .await;
    // The first listing is rejected as if the session had expired
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(header("Cookie", "VW_ADMIN=session-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::sample_users()))
        .expect(1)
        .mount(&server)
        .await;
    let client = common::client_for(&server, ADMIN_TOKEN);

    let users = client.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn test_persistent_401_after_relogin_is_unauthorized() {
    let (server, client) = common::setup_vaultwarden_mock().await;
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, VaultwardenError::Unauthorized(_)));
}
