//! Admin user endpoints: list, invite, enable, disable

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use vwsync_core::domain::AccountId;
use vwsync_vaultwarden::VaultwardenError;

use crate::common::{self, SESSION_COOKIE};

#[tokio::test]
async fn test_list_users_parses_accounts() {
    let (server, client) = common::setup_vaultwarden_mock().await;
    common::mount_users(&server, SESSION_COOKIE, common::sample_users()).await;

    let users = client.list_users().await.expect("list_users failed");

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].email, "alice@example.com");
    assert!(users[0].enabled);
    assert_eq!(users[1].id.as_str(), "22222222-2222-2222-2222-222222222222");
    assert!(!users[1].enabled);
}

#[tokio::test]
async fn test_list_users_accepts_legacy_key_casing() {
    let (server, client) = common::setup_vaultwarden_mock().await;
    common::mount_users(
        &server,
        SESSION_COOKIE,
        serde_json::json!([
            { "Id": "u-legacy", "Email": "old@example.com", "UserEnabled": true }
        ]),
    )
    .await;

    let users = client.list_users().await.unwrap();
    assert_eq!(users[0].id.as_str(), "u-legacy");
    assert_eq!(users[0].email, "old@example.com");
}

#[tokio::test]
async fn test_list_users_rejects_non_array() {
    let (server, client) = common::setup_vaultwarden_mock().await;
    common::mount_users(&server, SESSION_COOKIE, serde_json::json!({ "data": [] })).await;

    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, VaultwardenError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_invite_returns_new_id() {
    let (server, client) = common::setup_vaultwarden_mock().await;
    Mock::given(method("POST"))
        .and(path("/admin/invite"))
        .and(header("Cookie", "VW_ADMIN=session-1"))
        .and(body_json(serde_json::json!({ "email": "carol@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "33333333-3333-3333-3333-333333333333",
            "email": "carol@example.com",
            "userEnabled": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client.invite("carol@example.com").await.unwrap();
    assert_eq!(id.as_str(), "33333333-3333-3333-3333-333333333333");
}

#[tokio::test]
async fn test_enable_and_disable_hit_user_endpoints() {
    let (server, client) = common::setup_vaultwarden_mock().await;
    for action in ["enable", "disable"] {
        Mock::given(method("POST"))
            .and(path(format!("/admin/users/u1/{action}")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    let id = AccountId::new("u1").unwrap();
    client.enable(&id).await.unwrap();
    client.disable(&id).await.unwrap();
}

#[tokio::test]
async fn test_unexpected_status_is_reported() {
    let (server, client) = common::setup_vaultwarden_mock().await;
    Mock::given(method("POST"))
        .and(path("/admin/users/missing/disable"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client
        .disable(&AccountId::new("missing").unwrap())
        .await
        .unwrap_err();
    match err {
        VaultwardenError::UnexpectedStatus {
            path,
            expected,
            actual,
        } => {
            assert_eq!(path, "/admin/users/missing/disable");
            assert_eq!(expected, 200);
            assert_eq!(actual, 404);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
