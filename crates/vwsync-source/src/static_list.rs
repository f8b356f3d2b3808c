//! Fixed member list taken from the configuration

use std::collections::BTreeSet;

use tracing::info;

use vwsync_core::ports::IEmailSource;

pub struct StaticEmailSource {
    emails: BTreeSet<String>,
}

impl StaticEmailSource {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait::async_trait]
impl IEmailSource for StaticEmailSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn list_member_emails(&self) -> anyhow::Result<BTreeSet<String>> {
        info!(source = self.name(), count = self.emails.len(), "Listing configured member emails");
        Ok(self.emails.clone())
    }
}
