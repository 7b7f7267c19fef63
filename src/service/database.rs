//! Local-store-only backend.

use crate::database::{DatabaseUserStore, UserRepository};
use crate::error::IdentityResult;
use crate::identity::IdentityRecord;
use crate::service::{SearchWindow, UserService};
use log::debug;

/// Resolves users from the local relational store alone.
#[derive(Debug, Clone)]
pub struct DatabaseUserService<R: UserRepository> {
    store: DatabaseUserStore<R>,
    page_size: usize,
}

impl<R: UserRepository> DatabaseUserService<R> {
    pub fn new(store: DatabaseUserStore<R>, page_size: usize) -> Self {
        Self { store, page_size }
    }

    pub fn store(&self) -> &DatabaseUserStore<R> {
        &self.store
    }
}

/// Every row a search could page through, up to the end of `window`: empty
/// keyword lists enabled users, otherwise a case-insensitive substring match
/// on the username. The window itself is left to the caller.
pub(crate) async fn search_store<R: UserRepository>(
    store: &DatabaseUserStore<R>,
    keyword: &str,
    window: SearchWindow,
) -> IdentityResult<Vec<IdentityRecord>> {
    let rows = if keyword.is_empty() {
        store.find_enabled(window.fetch_size()).await?
    } else {
        store.find_by_prefix(keyword, window.fetch_size()).await?
    };
    Ok(rows)
}

impl<R: UserRepository> UserService for DatabaseUserService<R> {
    async fn search(
        &self,
        keyword: &str,
        offset: usize,
        limit: usize,
    ) -> IdentityResult<Vec<IdentityRecord>> {
        let window = SearchWindow::new(offset, limit, self.page_size);
        let found = window.apply(search_store(&self.store, keyword, window).await?);
        debug!("Database search '{}' returned {} users", keyword, found.len());
        Ok(found)
    }

    async fn find_by_id(&self, id: &str) -> IdentityResult<Option<IdentityRecord>> {
        Ok(self.store.find_by_id(id).await?)
    }

    async fn find_by_ids(&self, ids: &[String]) -> IdentityResult<Vec<IdentityRecord>> {
        Ok(self.store.find_by_ids(ids).await?)
    }
}
