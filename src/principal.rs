//! Canonical identity of the authenticated caller.
//!
//! Each authentication mechanism leaves a principal of its own shape behind:
//! a directory bind yields a login name and DN, the local store yields the
//! account row, SSO protocols yield a bare username or name. [`Principal`]
//! enumerates those shapes and [`PrincipalExtractor`] maps every one of them
//! to an [`IdentityRecord`].
//!
//! # Example Usage
//!
//! ```rust
//! use federated_identity::principal::{Principal, PrincipalExtractor};
//!
//! let extractor = PrincipalExtractor::default();
//! let principal = Principal::directory("jdoe", "cn=John Doe,ou=people,dc=acme,dc=com");
//! let record = extractor.extract(&principal);
//! assert_eq!(record.id, "jdoe");
//! assert_eq!(record.display_name(), Some("John Doe"));
//!
//! let record = extractor.extract(&Principal::opaque(42));
//! assert_eq!(record.id, "42");
//! ```

use crate::config::DirectoryConfig;
use crate::database::{DatabaseUserStore, LocalAccount, UserRepository};
use crate::directory::DistinguishedName;
use crate::error::IdentityResult;
use crate::identity::IdentityRecord;
use log::{debug, trace};
use std::fmt;

const DEFAULT_RDN_KEY: &str = "cn";

/// An authenticated principal, in whichever shape the mechanism produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Bound against the directory: login name plus the entry's DN.
    Directory { username: String, dn: String },
    /// Authenticated against the local store.
    Local(LocalAccount),
    /// Generic user details carrying a username.
    Details { username: String },
    /// Generic named principal.
    Named { name: String },
    /// Anything else, kept as its textual form.
    Opaque(String),
}

impl Principal {
    pub fn directory(username: impl Into<String>, dn: impl Into<String>) -> Self {
        Self::Directory {
            username: username.into(),
            dn: dn.into(),
        }
    }

    pub fn details(username: impl Into<String>) -> Self {
        Self::Details {
            username: username.into(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    pub fn opaque(value: impl fmt::Display) -> Self {
        Self::Opaque(value.to_string())
    }
}

impl From<LocalAccount> for Principal {
    fn from(account: LocalAccount) -> Self {
        Self::Local(account)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory { username, .. } => write!(f, "{}", username),
            Self::Local(account) => write!(f, "{}", account.username),
            Self::Details { username } => write!(f, "{}", username),
            Self::Named { name } => write!(f, "{}", name),
            Self::Opaque(value) => write!(f, "{}", value),
        }
    }
}

/// Maps principals to identity records. Never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalExtractor {
    rdn_key: String,
}

impl PrincipalExtractor {
    /// `rdn_key` names the DN component carrying a directory user's display name.
    pub fn new(rdn_key: impl Into<String>) -> Self {
        Self {
            rdn_key: rdn_key.into(),
        }
    }

    pub fn for_directory(config: &DirectoryConfig) -> Self {
        Self::new(config.display_name_rdn_key.as_str())
    }

    pub fn rdn_key(&self) -> &str {
        &self.rdn_key
    }

    pub fn extract(&self, principal: &Principal) -> IdentityRecord {
        match principal {
            Principal::Directory { username, dn } => IdentityRecord {
                id: username.clone(),
                display_name: self.display_name_from_dn(dn),
                email: None,
            },
            Principal::Local(account) => account.to_identity(),
            Principal::Details { username } => IdentityRecord::new(username.as_str()),
            Principal::Named { name } => IdentityRecord::new(name.as_str()),
            Principal::Opaque(value) => IdentityRecord::new(value.as_str()),
        }
    }

    fn display_name_from_dn(&self, dn: &str) -> Option<String> {
        match DistinguishedName::parse(dn) {
            Ok(parsed) => parsed.value_of(&self.rdn_key).map(str::to_string),
            Err(e) => {
                trace!("Principal DN not parseable, no display name: {}", e);
                None
            }
        }
    }
}

impl Default for PrincipalExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_RDN_KEY)
    }
}

/// Loads local accounts for usernames asserted by an upstream SSO server.
#[derive(Debug, Clone)]
pub struct LocalAccountLoader<R: UserRepository> {
    store: DatabaseUserStore<R>,
}

impl<R: UserRepository> LocalAccountLoader<R> {
    pub fn new(store: DatabaseUserStore<R>) -> Self {
        Self { store }
    }

    /// The local principal for `username`; `None` when the account is
    /// unknown or disabled.
    pub async fn load(&self, username: &str) -> IdentityResult<Option<Principal>> {
        let account = self.store.load_account(username).await?;
        if account.is_none() {
            debug!("No enabled local account for asserted user '{}'", username);
        }
        Ok(account.map(Principal::Local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{InMemoryUserRepository, UserRow};

    #[test]
    fn test_directory_principal_display_name() {
        let extractor = PrincipalExtractor::default();

        let record = extractor.extract(&Principal::directory("bob", "uid=bob,cn=Bob Smith,dc=acme"));
        assert_eq!(record.display_name(), Some("Bob Smith"));

        let record = extractor.extract(&Principal::directory("bob", "uid=bob,dc=acme"));
        assert_eq!(record.id, "bob");
        assert_eq!(record.display_name(), None);

        let record = extractor.extract(&Principal::directory("bob", "garbage"));
        assert_eq!(record.id, "bob");
        assert_eq!(record.display_name(), None);
    }

    #[test]
    fn test_custom_rdn_key() {
        let extractor = PrincipalExtractor::new("displayName");
        let record = extractor.extract(&Principal::directory("x", "displayName=Xavier,dc=acme"));
        assert_eq!(record.display_name(), Some("Xavier"));
    }

    #[test]
    fn test_generic_shapes() {
        let extractor = PrincipalExtractor::default();
        assert_eq!(extractor.extract(&Principal::details("d")), IdentityRecord::new("d"));
        assert_eq!(extractor.extract(&Principal::named("n")), IdentityRecord::new("n"));
        assert_eq!(extractor.extract(&Principal::opaque("o")), IdentityRecord::new("o"));
    }

    #[tokio::test]
    async fn test_local_account_loader() {
        let repository = InMemoryUserRepository::new();
        repository
            .insert(UserRow::new("erin").with_display_name("Erin").with_email("erin@acme.com"))
            .await;
        repository.insert(UserRow::new("frank").disabled()).await;
        repository.grant("erin", ["ROLE_user"]).await;
        let loader = LocalAccountLoader::new(DatabaseUserStore::new(repository));

        let principal = loader.load("erin").await.unwrap().unwrap();
        let record = PrincipalExtractor::default().extract(&principal);
        assert_eq!(
            record,
            IdentityRecord::new("erin").with_display_name("Erin").with_email("erin@acme.com")
        );
        match principal {
            Principal::Local(account) => assert_eq!(account.authorities, vec!["ROLE_user"]),
            other => panic!("expected a local principal, got {:?}", other),
        }

        assert!(loader.load("frank").await.unwrap().is_none());
        assert!(loader.load("ghost").await.unwrap().is_none());
    }
}
