//! VaultwardenDirectory through the IRemoteDirectory port

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use vwsync_core::domain::AccountId;
use vwsync_core::ports::IRemoteDirectory;
use vwsync_vaultwarden::{VaultwardenDirectory, VaultwardenError};

use crate::common::{self, SESSION_COOKIE};

#[tokio::test]
async fn test_list_accounts_through_port() {
    let (server, client) = common::setup_vaultwarden_mock().await;
    common::mount_users(&server, SESSION_COOKIE, common::sample_users()).await;
    let directory: Box<dyn IRemoteDirectory> = Box::new(VaultwardenDirectory::new(client));

    let accounts = directory.list_accounts().await.unwrap();
    assert_eq!(accounts.len(), 2);
}

#[tokio::test]
async fn test_port_errors_keep_context_and_source() {
    let (server, client) = common::setup_vaultwarden_mock().await;
    Mock::given(method("POST"))
        .and(path("/admin/users/u1/enable"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let directory = VaultwardenDirectory::new(client);

    let err = directory
        .enable(&AccountId::new("u1").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to enable user u1");
    assert!(matches!(
        err.downcast_ref::<VaultwardenError>(),
        Some(VaultwardenError::UnexpectedStatus { actual: 500, .. })
    ));
}
