//! In-memory user repository for testing and development.
//!
//! Rows keep insertion order, which stands in for the storage order a real
//! `Users` table would return without an `ORDER BY`.

use crate::database::{DatabaseError, UserRepository, UserRow};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Thread-safe in-memory `Users`/`Authorities` store.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<UserRow>>>,
    authorities: Arc<RwLock<HashMap<String, Vec<String>>>>,
    available: Arc<AtomicBool>,
    queries: Arc<AtomicUsize>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(Vec::new())),
            authorities: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
            queries: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Insert a row, replacing any row with the same username.
    pub async fn insert(&self, row: UserRow) {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|existing| existing.username == row.username) {
            Some(existing) => *existing = row,
            None => users.push(row),
        }
    }

    /// Grant authorities to a username.
    pub async fn grant<I, S>(&self, username: &str, authorities: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut granted = self.authorities.write().await;
        granted
            .entry(username.to_string())
            .or_default()
            .extend(authorities.into_iter().map(Into::into));
    }

    /// Simulate the database becoming unreachable (or reachable again).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    fn begin_query(&self) -> Result<(), DatabaseError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(DatabaseError::unavailable("in-memory database is offline"));
        }
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn find_first_enabled(&self, limit: usize) -> Result<Vec<UserRow>, DatabaseError> {
        self.begin_query()?;
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|row| row.enabled)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_enabled_by_username_containing(
        &self,
        fragment: &str,
        limit: usize,
    ) -> Result<Vec<UserRow>, DatabaseError> {
        self.begin_query()?;
        let needle = fragment.to_lowercase();
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|row| row.enabled && row.username.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, DatabaseError> {
        self.begin_query()?;
        let users = self.users.read().await;
        Ok(users.iter().find(|row| row.username == username).cloned())
    }

    async fn find_by_usernames(&self, usernames: &[String]) -> Result<Vec<UserRow>, DatabaseError> {
        self.begin_query()?;
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|row| usernames.contains(&row.username))
            .cloned()
            .collect())
    }

    async fn find_authorities(&self, username: &str) -> Result<Vec<String>, DatabaseError> {
        self.begin_query()?;
        let granted = self.authorities.read().await;
        Ok(granted.get(username).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_replaces_same_username() {
        let repository = InMemoryUserRepository::new();
        repository.insert(UserRow::new("alice")).await;
        repository.insert(UserRow::new("alice").with_email("alice@acme.com")).await;
        assert_eq!(repository.len().await, 1);

        let row = repository.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(row.email.as_deref(), Some("alice@acme.com"));
    }

    #[tokio::test]
    async fn test_containing_respects_limit_and_enabled() {
        let repository = InMemoryUserRepository::new();
        for name in ["ann", "joanna", "hannah", "anne"] {
            repository.insert(UserRow::new(name)).await;
        }
        repository.insert(UserRow::new("annex").disabled()).await;

        let rows = repository
            .find_enabled_by_username_containing("AN", 3)
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["ann", "joanna", "hannah"]);
    }

    #[tokio::test]
    async fn test_unavailable_and_query_count() {
        let repository = InMemoryUserRepository::new();
        repository.find_first_enabled(5).await.unwrap();
        assert_eq!(repository.query_count(), 1);

        repository.set_available(false);
        let result = repository.find_authorities("alice").await;
        assert!(matches!(result, Err(DatabaseError::Unavailable { .. })));
        assert_eq!(repository.query_count(), 1);
    }
}
