//! Email source port (driven/secondary port)
//!
//! The source is authoritative: every email it lists should end up with an
//! enabled account at the remote directory, and every managed account whose
//! invite email it no longer lists should end up disabled.

use std::collections::BTreeSet;

/// Port trait for the authoritative member list
#[async_trait::async_trait]
pub trait IEmailSource: Send + Sync {
    /// Short name of the backend, used in log fields
    fn name(&self) -> &str;

    /// Returns the current set of member emails
    ///
    /// An empty set is a valid answer and results in every managed account
    /// being planned for disable.
    async fn list_member_emails(&self) -> anyhow::Result<BTreeSet<String>>;
}
