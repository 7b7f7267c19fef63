//! Backend for identities asserted by an upstream SSO protocol.
//!
//! The upstream server has already authenticated the user, so any non-empty
//! id is taken as a valid identity. A wired local store only adds display
//! names and emails; it never hides an asserted id.

use crate::database::{DatabaseUserStore, UserRepository};
use crate::error::IdentityResult;
use crate::identity::IdentityRecord;
use crate::merge::merge;
use crate::service::database::search_store;
use crate::service::{SearchWindow, UserService};
use log::trace;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PassThroughUserService<R: UserRepository> {
    local: Option<DatabaseUserStore<R>>,
    page_size: usize,
}

impl<R: UserRepository> PassThroughUserService<R> {
    pub fn new(page_size: usize) -> Self {
        Self {
            local: None,
            page_size,
        }
    }

    pub fn with_local_store(mut self, store: DatabaseUserStore<R>) -> Self {
        self.local = Some(store);
        self
    }
}

impl<R: UserRepository> UserService for PassThroughUserService<R> {
    /// Only locally known users are searchable; without a local store the
    /// result is always empty.
    async fn search(
        &self,
        keyword: &str,
        offset: usize,
        limit: usize,
    ) -> IdentityResult<Vec<IdentityRecord>> {
        match &self.local {
            Some(local) => {
                let window = SearchWindow::new(offset, limit, self.page_size);
                Ok(window.apply(search_store(local, keyword, window).await?))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn find_by_id(&self, id: &str) -> IdentityResult<Option<IdentityRecord>> {
        if id.is_empty() {
            return Ok(None);
        }
        if let Some(local) = &self.local {
            if let Some(record) = local.find_by_id(id).await? {
                return Ok(Some(record));
            }
        }
        trace!("'{}' accepted as asserted upstream", id);
        Ok(Some(IdentityRecord::new(id)))
    }

    async fn find_by_ids(&self, ids: &[String]) -> IdentityResult<Vec<IdentityRecord>> {
        let asserted: Vec<IdentityRecord> = ids
            .iter()
            .filter(|id| !id.is_empty())
            .map(IdentityRecord::new)
            .collect();
        let known: HashMap<String, IdentityRecord> = match &self.local {
            Some(local) if !asserted.is_empty() => local
                .find_by_ids(ids)
                .await?
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
            _ => HashMap::new(),
        };

        // Keep the caller's order, preferring the enriched local record.
        let enriched = asserted
            .into_iter()
            .map(|record| known.get(&record.id).cloned().unwrap_or(record))
            .collect();
        Ok(merge(enriched, Vec::new()))
    }
}
