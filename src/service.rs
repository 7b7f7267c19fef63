//! The uniform user lookup contract and its backend strategies.
//!
//! Every deployment exposes exactly one [`UserService`]. Which one is decided
//! at startup by [`BackendSelector`](crate::selector::BackendSelector):
//!
//! - [`StaticUserService`] - a single built-in account, for demos
//! - [`DatabaseUserService`] - the local relational store only
//! - [`DirectoryUserService`] - the directory, optionally consulted after the
//!   local store
//! - [`PassThroughUserService`] - identities asserted by an upstream SSO
//!   protocol, enriched from the local store when one is wired
//!
//! # Example Usage
//!
//! ```rust
//! use federated_identity::service::{StaticUserService, UserService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = StaticUserService::new();
//! let users = service.search("", 0, 10).await?;
//! assert_eq!(users[0].id, "apollo");
//! assert!(service.find_by_id("someone-else").await?.is_none());
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod directory;
pub mod pass_through;
pub mod static_users;

pub use database::DatabaseUserService;
pub use directory::DirectoryUserService;
pub use pass_through::PassThroughUserService;
pub use static_users::StaticUserService;

use crate::error::IdentityResult;
use crate::identity::IdentityRecord;
use std::future::Future;

/// User search and resolution, independent of the backing store.
///
/// Lookups that find nothing return `None` or an empty list. Errors are
/// reserved for transport failures and malformed directory references; no
/// operation returns a partial result.
pub trait UserService: Send + Sync {
    /// Search users by a free-text keyword.
    ///
    /// An empty keyword lists users. `limit == 0` means the configured page
    /// size. Results are never longer than the effective limit.
    fn search(
        &self,
        keyword: &str,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = IdentityResult<Vec<IdentityRecord>>> + Send;

    /// Resolve one user by exact id.
    fn find_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = IdentityResult<Option<IdentityRecord>>> + Send;

    /// Resolve a set of ids. Unknown ids are left out of the result.
    fn find_by_ids(
        &self,
        ids: &[String],
    ) -> impl Future<Output = IdentityResult<Vec<IdentityRecord>>> + Send;
}

/// The `offset`/`limit` window of one search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub offset: usize,
    pub limit: usize,
}

impl SearchWindow {
    /// Resolve a caller window; a zero limit falls back to `page_size`.
    pub fn new(offset: usize, limit: usize, page_size: usize) -> Self {
        Self {
            offset,
            limit: if limit == 0 { page_size } else { limit },
        }
    }

    /// Rows a store must return so the window can be cut from them.
    pub fn fetch_size(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }

    pub fn apply(&self, records: Vec<IdentityRecord>) -> Vec<IdentityRecord> {
        crate::merge::page(records, self.offset, self.limit)
    }
}
