//! vwsync-source - Authoritative member lists
//!
//! Every backend implements [`IEmailSource`]; [`build_email_source`] picks
//! one from the `source` section of the configuration.

pub mod ldap;
pub mod random;
pub mod static_list;

use vwsync_core::config::{SourceConfig, SourceKind};
use vwsync_core::ports::IEmailSource;

pub use ldap::LdapEmailSource;
pub use random::RandomEmailSource;
pub use static_list::StaticEmailSource;

/// Error type for source operations
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: ldap3::LdapError,
    },

    #[error("Bind as '{bind_dn}' rejected (rc={rc}): {text}")]
    Bind { bind_dn: String, rc: u32, text: String },

    #[error("Search below '{base_dn}' failed (rc={rc}): {text}")]
    Search { base_dn: String, rc: u32, text: String },

    #[error("LDAP protocol error: {0}")]
    Protocol(#[from] ldap3::LdapError),
}

/// Builds the email source selected by `config.kind`
pub fn build_email_source(config: &SourceConfig) -> Box<dyn IEmailSource> {
    match config.kind {
        SourceKind::Ldap => Box::new(LdapEmailSource::new(config.ldap.clone())),
        SourceKind::Random => Box::new(RandomEmailSource::new()),
        SourceKind::Static => Box::new(StaticEmailSource::new(config.static_emails.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_selects_backend_by_kind() {
        let mut config = SourceConfig::default();
        assert_eq!(build_email_source(&config).name(), "ldap");

        config.kind = SourceKind::Random;
        assert_eq!(build_email_source(&config).name(), "random");

        config.kind = SourceKind::Static;
        assert_eq!(build_email_source(&config).name(), "static");
    }

    #[test]
    fn test_bind_error_display() {
        let err = SourceError::Bind {
            bind_dn: "cn=admin,dc=example,dc=com".into(),
            rc: 49,
            text: "invalid credentials".into(),
        };
        assert_eq!(
            err.to_string(),
            "Bind as 'cn=admin,dc=example,dc=com' rejected (rc=49): invalid credentials"
        );
    }
}
