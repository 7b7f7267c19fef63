//! Directory-backed user service.
//!
//! With a local store wired the store is always asked first, and any non-empty
//! answer from it is final: the directory is not consulted for that call.
//! Without a group configured the directory is searched by attribute filter;
//! with one, only the group's members are visible.

use crate::config::DirectoryConfig;
use crate::database::{DatabaseUserStore, UserRepository};
use crate::directory::{DirectoryGroupResolver, DirectoryQueryBuilder, DirectoryTransport, Filter};
use crate::error::IdentityResult;
use crate::identity::IdentityRecord;
use crate::merge::merge;
use crate::service::database::search_store;
use crate::service::{SearchWindow, UserService};
use log::{debug, trace, warn};
use std::collections::HashSet;

/// User service over a directory, with an optional local store in front.
#[derive(Debug, Clone)]
pub struct DirectoryUserService<D: DirectoryTransport, R: UserRepository> {
    transport: D,
    local: Option<DatabaseUserStore<R>>,
    config: DirectoryConfig,
    page_size: usize,
}

impl<D: DirectoryTransport, R: UserRepository> DirectoryUserService<D, R> {
    /// Directory only.
    pub fn new(transport: D, config: DirectoryConfig, page_size: usize) -> Self {
        Self {
            transport,
            local: None,
            config,
            page_size,
        }
    }

    /// Consult `store` before the directory.
    pub fn with_local_store(mut self, store: DatabaseUserStore<R>) -> Self {
        self.local = Some(store);
        self
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    pub fn transport(&self) -> &D {
        &self.transport
    }

    fn query_builder(&self) -> DirectoryQueryBuilder<'_> {
        DirectoryQueryBuilder::new(&self.config.mapping, &self.config.filter)
    }

    /// Run a user filter against the whole directory and map the hits.
    async fn search_entries(&self, filter: &Filter) -> IdentityResult<Vec<IdentityRecord>> {
        trace!("Directory search {}", filter);
        let entries = self.transport.search("", filter).await?;
        Ok(entries
            .iter()
            .filter_map(|entry| entry.to_identity(&self.config.mapping))
            .collect())
    }

    async fn search_directory(&self, keyword: &str) -> IdentityResult<Vec<IdentityRecord>> {
        match &self.config.group {
            Some(group) => {
                DirectoryGroupResolver::new(&self.transport, &self.config)
                    .resolve_group(group, keyword, None)
                    .await
            }
            None => self.search_entries(&self.query_builder().build(keyword)).await,
        }
    }

    /// Resolve `ids` in the directory, keeping only those ids.
    async fn resolve_directory_ids(&self, ids: &[String]) -> IdentityResult<Vec<IdentityRecord>> {
        match &self.config.group {
            Some(group) => {
                let allowed: HashSet<String> = ids.iter().cloned().collect();
                DirectoryGroupResolver::new(&self.transport, &self.config)
                    .resolve_group(group, "", Some(&allowed))
                    .await
            }
            None => match self.query_builder().by_login_ids(ids) {
                Some(filter) => self.search_entries(&filter).await,
                None => Ok(Vec::new()),
            },
        }
    }
}

impl<D: DirectoryTransport, R: UserRepository> UserService for DirectoryUserService<D, R> {
    async fn search(
        &self,
        keyword: &str,
        offset: usize,
        limit: usize,
    ) -> IdentityResult<Vec<IdentityRecord>> {
        let window = SearchWindow::new(offset, limit, self.page_size);

        // The local store wins on any match, whichever page was asked for.
        if let Some(local) = &self.local {
            let matched = search_store(local, keyword, window).await?;
            if !matched.is_empty() {
                debug!(
                    "Local store matched search '{}' with {} users, directory skipped",
                    keyword,
                    matched.len()
                );
                return Ok(window.apply(matched));
            }
        }

        let found = self.search_directory(keyword).await?;
        debug!("Directory search '{}' matched {} users", keyword, found.len());
        Ok(window.apply(merge(Vec::new(), found)))
    }

    async fn find_by_id(&self, id: &str) -> IdentityResult<Option<IdentityRecord>> {
        if let Some(local) = &self.local {
            if let Some(record) = local.find_by_id(id).await? {
                debug!("'{}' resolved from the local store", id);
                return Ok(Some(record));
            }
        }

        let mut found = match &self.config.group {
            Some(_) => self.resolve_directory_ids(&[id.to_string()]).await?,
            None => self.search_entries(&self.query_builder().by_login_id(id)).await?,
        };
        if found.len() > 1 {
            warn!("'{}' matched {} directory entries, using the first", id, found.len());
        }
        Ok((!found.is_empty()).then(|| found.swap_remove(0)))
    }

    async fn find_by_ids(&self, ids: &[String]) -> IdentityResult<Vec<IdentityRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let local = match &self.local {
            Some(store) => store.find_by_ids(ids).await?,
            None => Vec::new(),
        };
        let resolved: HashSet<&str> = local.iter().map(|record| record.id.as_str()).collect();
        let mut queued: HashSet<&str> = HashSet::new();
        let mut pending: Vec<String> = Vec::new();
        for id in ids {
            if !resolved.contains(id.as_str()) && queued.insert(id.as_str()) {
                pending.push(id.clone());
            }
        }
        if pending.is_empty() {
            return Ok(local);
        }

        debug!(
            "{} of {} ids not in the local store, asking the directory",
            pending.len(),
            ids.len()
        );
        let remote = self.resolve_directory_ids(&pending).await?;
        Ok(merge(local, remote))
    }
}
