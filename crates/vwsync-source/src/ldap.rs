//! LDAP member source
//!
//! One connection per pass: connect, simple bind, subtree search, unbind.
//! Each matching entry contributes the first value of the configured email
//! attribute.

use std::collections::BTreeSet;
use std::time::Duration;

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchResult};
use tracing::{debug, info, warn};

use vwsync_core::config::LdapConfig;
use vwsync_core::ports::IEmailSource;

use crate::SourceError;

/// `noSuchObject`: the search base does not exist
const RC_NO_SUCH_OBJECT: u32 = 32;

/// Email source backed by an LDAP directory
pub struct LdapEmailSource {
    config: LdapConfig,
}

impl LdapEmailSource {
    pub fn new(config: LdapConfig) -> Self {
        Self { config }
    }

    /// Connection URL, `{scheme}://{server}`
    pub fn url(&self) -> String {
        format!("{}://{}", self.config.scheme, self.config.server)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn connect(&self) -> Result<Ldap, SourceError> {
        let url = self.url();
        let settings = LdapConnSettings::new().set_conn_timeout(self.timeout());

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|source| SourceError::Connect {
                url: url.clone(),
                source,
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        debug!(url = %url, "Connected to LDAP server");
        Ok(ldap)
    }

    async fn bind(&self, ldap: &mut Ldap) -> Result<(), SourceError> {
        let result = ldap
            .with_timeout(self.timeout())
            .simple_bind(&self.config.bind_dn, &self.config.bind_password)
            .await?;

        if result.rc != 0 {
            return Err(SourceError::Bind {
                bind_dn: self.config.bind_dn.clone(),
                rc: result.rc,
                text: result.text,
            });
        }
        Ok(())
    }

    async fn search(&self, ldap: &mut Ldap) -> Result<BTreeSet<String>, SourceError> {
        let SearchResult(entries, result) = ldap
            .with_timeout(self.timeout())
            .search(
                &self.config.base_dn,
                Scope::Subtree,
                &self.config.search_filter,
                vec![self.config.email_attribute.as_str()],
            )
            .await?;

        if result.rc == RC_NO_SUCH_OBJECT {
            warn!(
                base_dn = %self.config.base_dn,
                filter = %self.config.search_filter,
                "LDAP search returned no results"
            );
            return Ok(BTreeSet::new());
        }
        if result.rc != 0 {
            return Err(SourceError::Search {
                base_dn: self.config.base_dn.clone(),
                rc: result.rc,
                text: result.text,
            });
        }

        let entries = entries.into_iter().map(SearchEntry::construct);
        Ok(collect_emails(entries, &self.config.email_attribute))
    }

    async fn fetch(&self) -> Result<BTreeSet<String>, SourceError> {
        let mut ldap = self.connect().await?;

        let outcome = match self.bind(&mut ldap).await {
            Ok(()) => self.search(&mut ldap).await,
            Err(e) => Err(e),
        };

        if let Err(e) = ldap.unbind().await {
            debug!(error = %e, "LDAP unbind failed");
        }
        outcome
    }
}

/// First value of `attribute` for every entry that carries it
///
/// Attribute names are compared case-insensitively, as LDAP servers echo
/// them in their own spelling.
pub(crate) fn collect_emails<I>(entries: I, attribute: &str) -> BTreeSet<String>
where
    I: IntoIterator<Item = SearchEntry>,
{
    let mut emails = BTreeSet::new();
    for entry in entries {
        let value = entry
            .attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .and_then(|(_, values)| values.first());

        match value {
            Some(email) => {
                emails.insert(email.clone());
            }
            None => debug!(dn = %entry.dn, attribute, "Entry has no email attribute, skipping"),
        }
    }
    emails
}

#[async_trait::async_trait]
impl IEmailSource for LdapEmailSource {
    fn name(&self) -> &str {
        "ldap"
    }

    async fn list_member_emails(&self) -> anyhow::Result<BTreeSet<String>> {
        let emails = self.fetch().await?;
        info!(
            source = self.name(),
            server = %self.config.server,
            count = emails.len(),
            "Fetched member emails"
        );
        Ok(emails)
    }
}
