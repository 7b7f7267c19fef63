//! Local relational user store.
//!
//! The relational transport is an external collaborator, consumed through the
//! [`UserRepository`] trait over the `Users` and `Authorities` relations.
//! [`DatabaseUserStore`] layers the visibility rules on top of it: only
//! enabled rows are ever returned, and page sizes are hard caps.
//!
//! # Example Usage
//!
//! ```rust
//! use federated_identity::database::{DatabaseUserStore, InMemoryUserRepository, UserRow};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = InMemoryUserRepository::new();
//! repository.insert(UserRow::new("alice").with_display_name("Alice")).await;
//! repository.insert(UserRow::new("alfred").disabled()).await;
//!
//! let store = DatabaseUserStore::new(repository);
//! let found = store.find_by_prefix("AL", 10).await?;
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].id, "alice");
//! # Ok(())
//! # }
//! ```

pub mod in_memory;
pub mod sql;

pub use in_memory::InMemoryUserRepository;

use crate::identity::IdentityRecord;
use log::{debug, trace};
use std::future::Future;

/// Errors reported by a relational transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatabaseError {
    /// The database could not be reached
    #[error("Database unavailable: {message}")]
    Unavailable { message: String },

    /// A query failed
    #[error("Query '{query}' failed: {message}")]
    Query { query: String, message: String },
}

impl DatabaseError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            query: query.into(),
            message: message.into(),
        }
    }
}

/// One row of the `Users` relation.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRow {
    pub username: String,
    /// Password hash; never leaves the store.
    pub password: String,
    pub enabled: bool,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl UserRow {
    /// An enabled row with no password, display name or email.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: String::new(),
            enabled: true,
            display_name: None,
            email: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_password(mut self, password_hash: impl Into<String>) -> Self {
        self.password = password_hash.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn to_identity(&self) -> IdentityRecord {
        IdentityRecord {
            id: self.username.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

impl std::fmt::Debug for UserRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRow")
            .field("username", &self.username)
            .field("enabled", &self.enabled)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A locally managed account together with its granted authorities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAccount {
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    pub authorities: Vec<String>,
}

impl LocalAccount {
    pub fn from_row(row: &UserRow, authorities: Vec<String>) -> Self {
        Self {
            username: row.username.clone(),
            display_name: row.display_name.clone(),
            email: row.email.clone(),
            enabled: row.enabled,
            authorities,
        }
    }

    pub fn to_identity(&self) -> IdentityRecord {
        IdentityRecord {
            id: self.username.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Query capability of the relational store.
///
/// Implementations run the statements in [`sql`] (or equivalents). Username
/// fragment matching is case-insensitive.
pub trait UserRepository: Send + Sync {
    /// Up to `limit` enabled rows, in storage order.
    fn find_first_enabled(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<UserRow>, DatabaseError>> + Send;

    /// Up to `limit` enabled rows whose username contains `fragment`.
    fn find_enabled_by_username_containing(
        &self,
        fragment: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<UserRow>, DatabaseError>> + Send;

    /// The row with exactly this username, enabled or not.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserRow>, DatabaseError>> + Send;

    /// Rows whose username is one of `usernames`, enabled or not.
    fn find_by_usernames(
        &self,
        usernames: &[String],
    ) -> impl Future<Output = Result<Vec<UserRow>, DatabaseError>> + Send;

    /// Authorities granted to `username`.
    fn find_authorities(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Vec<String>, DatabaseError>> + Send;
}

/// Enabled-user view over a [`UserRepository`].
#[derive(Debug, Clone)]
pub struct DatabaseUserStore<R: UserRepository> {
    repository: R,
}

impl<R: UserRepository> DatabaseUserStore<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// The first `page_size` enabled users.
    pub async fn find_enabled(&self, page_size: usize) -> Result<Vec<IdentityRecord>, DatabaseError> {
        if page_size == 0 {
            return Ok(Vec::new());
        }
        let rows = self.repository.find_first_enabled(page_size).await?;
        Ok(visible(rows, page_size))
    }

    /// Enabled users whose username contains `keyword`, ignoring case.
    ///
    /// Despite the name this is a substring match, not a prefix match.
    pub async fn find_by_prefix(
        &self,
        keyword: &str,
        page_size: usize,
    ) -> Result<Vec<IdentityRecord>, DatabaseError> {
        if page_size == 0 {
            return Ok(Vec::new());
        }
        let rows = self
            .repository
            .find_enabled_by_username_containing(keyword, page_size)
            .await?;
        let found = visible(rows, page_size);
        debug!("Local store matched {} users for '{}'", found.len(), keyword);
        Ok(found)
    }

    /// The enabled user with exactly this id.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>, DatabaseError> {
        let row = self.repository.find_by_username(id).await?;
        Ok(row.filter(|row| row.enabled).map(|row| row.to_identity()))
    }

    /// Enabled users whose ids are in `ids`.
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<IdentityRecord>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.repository.find_by_usernames(ids).await?;
        Ok(visible(rows, usize::MAX))
    }

    /// Load an enabled local account with its authorities.
    pub async fn load_account(&self, username: &str) -> Result<Option<LocalAccount>, DatabaseError> {
        let Some(row) = self.repository.find_by_username(username).await? else {
            return Ok(None);
        };
        if !row.enabled {
            debug!("Local account '{}' is disabled", username);
            return Ok(None);
        }
        let authorities = self.repository.find_authorities(username).await?;
        Ok(Some(LocalAccount::from_row(&row, authorities)))
    }
}

fn visible(rows: Vec<UserRow>, cap: usize) -> Vec<IdentityRecord> {
    let total = rows.len();
    let records: Vec<_> = rows
        .into_iter()
        .filter(|row| row.enabled)
        .take(cap)
        .map(|row| row.to_identity())
        .collect();
    if records.len() != total {
        trace!("Dropped {} disabled or over-limit rows", total - records.len());
    }
    records
}
