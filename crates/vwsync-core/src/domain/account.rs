//! Account snapshots
//!
//! Two views of the same real-world account exist: the record kept in the
//! local ledger ([`ManagedAccount`]) and the record held by the remote
//! directory ([`RemoteAccount`]). They describe the same account iff their
//! [`AccountId`]s are equal; emails are never used to pair them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{errors::DomainError, newtypes::AccountId};

/// State of a managed account as last observed (or applied) by this system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerState {
    /// Account is enabled at the remote directory
    Enabled,
    /// Account is disabled at the remote directory
    Disabled,
    /// Account no longer exists at the remote directory
    Deleted,
}

impl LedgerState {
    /// All states, in storage order
    pub const ALL: [LedgerState; 3] = [
        LedgerState::Enabled,
        LedgerState::Disabled,
        LedgerState::Deleted,
    ];

    /// The canonical storage representation (`ENABLED`, `DISABLED`, `DELETED`)
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerState::Enabled => "ENABLED",
            LedgerState::Disabled => "DISABLED",
            LedgerState::Deleted => "DELETED",
        }
    }

    /// Maps a remote `enabled` flag to the state the ledger should mirror
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            LedgerState::Enabled
        } else {
            LedgerState::Disabled
        }
    }
}

impl fmt::Display for LedgerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerState {
    type Err = DomainError;

    /// Parses the exact storage representation. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENABLED" => Ok(LedgerState::Enabled),
            "DISABLED" => Ok(LedgerState::Disabled),
            "DELETED" => Ok(LedgerState::Deleted),
            other => Err(DomainError::InvalidState(other.to_string())),
        }
    }
}

/// An account recorded in the local ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedAccount {
    /// Identifier assigned by the remote directory
    pub id: AccountId,
    /// Last known email address at the remote directory
    pub tracked_email: String,
    /// Email address the account was invited (or adopted) with; never updated
    pub invite_email: String,
    /// Ledger state; `Enabled` is the only state counted as enabled
    pub state: LedgerState,
}

impl ManagedAccount {
    /// Creates a freshly registered account whose tracked email equals its invite email
    pub fn new(id: AccountId, invite_email: impl Into<String>, state: LedgerState) -> Self {
        let invite_email = invite_email.into();
        Self {
            id,
            tracked_email: invite_email.clone(),
            invite_email,
            state,
        }
    }

    /// Returns a copy with a different tracked email
    #[must_use]
    pub fn with_tracked_email(mut self, email: impl Into<String>) -> Self {
        self.tracked_email = email.into();
        self
    }

    /// Whether the ledger considers this account enabled
    pub fn enabled(&self) -> bool {
        self.state == LedgerState::Enabled
    }
}

/// An account as reported by the remote directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAccount {
    /// Identifier assigned by the remote directory
    pub id: AccountId,
    /// Current email address
    pub email: String,
    /// Whether the account is enabled
    pub enabled: bool,
}

impl RemoteAccount {
    pub fn new(id: AccountId, email: impl Into<String>, enabled: bool) -> Self {
        Self {
            id,
            email: email.into(),
            enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    #[test]
    fn test_state_roundtrip_through_str() {
        for state in LedgerState::ALL {
            assert_eq!(state.as_str().parse::<LedgerState>().unwrap(), state);
        }
    }

    #[test]
    fn test_state_parse_rejects_unknown_values() {
        let err = "enabled".parse::<LedgerState>().unwrap_err();
        assert_eq!(err, DomainError::InvalidState("enabled".to_string()));
        assert!("".parse::<LedgerState>().is_err());
        assert!("SUSPENDED".parse::<LedgerState>().is_err());
    }

    #[test]
    fn test_state_serde_uses_storage_names() {
        let json = serde_json::to_string(&LedgerState::Disabled).unwrap();
        assert_eq!(json, "\"DISABLED\"");
    }

    #[test]
    fn test_from_enabled() {
        assert_eq!(LedgerState::from_enabled(true), LedgerState::Enabled);
        assert_eq!(LedgerState::from_enabled(false), LedgerState::Disabled);
    }

    #[test]
    fn test_new_managed_account_tracks_invite_email() {
        let account = ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Enabled);
        assert_eq!(account.tracked_email, "a@test.com");
        assert_eq!(account.invite_email, "a@test.com");
        assert!(account.enabled());
    }

    #[test]
    fn test_deleted_and_disabled_are_not_enabled() {
        let disabled = ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Disabled);
        let deleted = ManagedAccount::new(id("u2"), "b@test.com", LedgerState::Deleted);
        assert!(!disabled.enabled());
        assert!(!deleted.enabled());
    }

    #[test]
    fn test_with_tracked_email_keeps_invite_email() {
        let account = ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Enabled)
            .with_tracked_email("new@test.com");
        assert_eq!(account.tracked_email, "new@test.com");
        assert_eq!(account.invite_email, "a@test.com");
    }
}
