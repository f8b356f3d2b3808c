//! Domain newtypes with validation

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Identifier assigned to an account by the remote directory
///
/// Vaultwarden uses UUID strings, but the engine treats the value as opaque:
/// two records describe the same account iff their ids are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Create a new AccountId
    ///
    /// # Errors
    /// Returns error if the id is empty or contains whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidAccountId(
                "Account ID cannot be empty".to_string(),
            ));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidAccountId(format!(
                "Account ID contains whitespace: {id:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_account_id() {
        let id = AccountId::new("2b1f7c0e-54a1-4b8e-9d3a-0c6f1e2d3a4b").unwrap();
        assert_eq!(id.as_str(), "2b1f7c0e-54a1-4b8e-9d3a-0c6f1e2d3a4b");
        assert_eq!(id.to_string(), "2b1f7c0e-54a1-4b8e-9d3a-0c6f1e2d3a4b");
    }

    #[test]
    fn test_empty_account_id_rejected() {
        assert!(AccountId::new("").is_err());
    }

    #[test]
    fn test_whitespace_account_id_rejected() {
        assert!(AccountId::new("abc def").is_err());
        assert!("abc\n".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_serde_rejects_empty() {
        let ok: AccountId = serde_json::from_str("\"u-1\"").unwrap();
        assert_eq!(ok.as_str(), "u-1");
        assert!(serde_json::from_str::<AccountId>("\"\"").is_err());
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = AccountId::new("a").unwrap();
        let b = AccountId::new("b").unwrap();
        assert!(a < b);
    }
}
