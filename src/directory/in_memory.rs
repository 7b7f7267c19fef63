//! In-memory directory for testing and development.
//!
//! Entries are held with absolute DNs below a configured base. Search bases
//! and lookup DNs passed to the transport are relative to that base, the same
//! way a directory connection configured with a base DN behaves.
//!
//! # Example Usage
//!
//! ```rust
//! use federated_identity::directory::{
//!     DirectoryEntry, DirectoryTransport, DistinguishedName, Filter, InMemoryDirectory,
//! };
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new("dc=example,dc=org");
//! directory
//!     .add_entry(
//!         DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=org", HashMap::new())
//!             .with_attr("objectClass", "inetOrgPerson")
//!             .with_attr("uid", "alice"),
//!     )
//!     .await;
//!
//! let found = directory.search("ou=people", &Filter::eq("uid", "alice")).await?;
//! assert_eq!(found.len(), 1);
//!
//! let dn = DistinguishedName::parse("uid=alice,ou=people")?;
//! assert!(directory.lookup(&dn).await?.is_some());
//! # Ok(())
//! # }
//! ```

use crate::directory::{DirectoryEntry, DirectoryError, DirectoryTransport, DistinguishedName, Filter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Operation counters, for asserting which calls reached the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InMemoryDirectoryStats {
    pub searches: usize,
    pub lookups: usize,
    pub entry_count: usize,
}

/// Thread-safe in-memory directory.
#[derive(Debug, Clone)]
pub struct InMemoryDirectory {
    base: String,
    entries: Arc<RwLock<Vec<DirectoryEntry>>>,
    available: Arc<AtomicBool>,
    searches: Arc<AtomicUsize>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryDirectory {
    /// Create an empty directory rooted at `base`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            entries: Arc::new(RwLock::new(Vec::new())),
            available: Arc::new(AtomicBool::new(true)),
            searches: Arc::new(AtomicUsize::new(0)),
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add an entry. Its DN must be absolute.
    pub async fn add_entry(&self, entry: DirectoryEntry) {
        let mut entries = self.entries.write().await;
        entries.push(entry);
    }

    /// Remove the entry with the given absolute DN; returns whether it existed.
    pub async fn remove_entry(&self, dn: &str) -> bool {
        let Ok(target) = DistinguishedName::parse(dn) else {
            return false;
        };
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| {
            DistinguishedName::parse(&entry.dn)
                .map(|existing| !existing.same_as(&target))
                .unwrap_or(true)
        });
        entries.len() != before
    }

    /// Simulate the server becoming unreachable (or reachable again).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn stats(&self) -> InMemoryDirectoryStats {
        InMemoryDirectoryStats {
            searches: self.searches.load(Ordering::SeqCst),
            lookups: self.lookups.load(Ordering::SeqCst),
            entry_count: self.entries.read().await.len(),
        }
    }

    fn check_available(&self) -> Result<(), DirectoryError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DirectoryError::unavailable("in-memory directory is offline"))
        }
    }

    fn root(&self) -> Result<DistinguishedName, DirectoryError> {
        parse_dn("base", &self.base)
    }
}

fn parse_dn(operation: &str, raw: &str) -> Result<DistinguishedName, DirectoryError> {
    DistinguishedName::parse(raw).map_err(|e| DirectoryError::operation_failed(operation, e.to_string()))
}

impl DirectoryTransport for InMemoryDirectory {
    async fn search(&self, base: &str, filter: &Filter) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        self.check_available()?;
        self.searches.fetch_add(1, Ordering::SeqCst);

        let search_base = parse_dn("search", base)?.join(&self.root()?);
        let entries = self.entries.read().await;
        let mut results = Vec::new();
        for entry in entries.iter() {
            let dn = parse_dn("search", &entry.dn)?;
            if dn.ends_with(&search_base) && filter.matches(entry) {
                results.push(entry.clone());
            }
        }
        Ok(results)
    }

    async fn lookup(&self, dn: &DistinguishedName) -> Result<Option<DirectoryEntry>, DirectoryError> {
        self.check_available()?;
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let target = dn.join(&self.root()?);
        let entries = self.entries.read().await;
        for entry in entries.iter() {
            if parse_dn("lookup", &entry.dn)?.same_as(&target) {
                return Ok(Some(entry.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn person(uid: &str) -> DirectoryEntry {
        DirectoryEntry::new(format!("uid={},ou=people,dc=example", uid), HashMap::new())
            .with_attr("objectClass", "person")
            .with_attr("uid", uid)
    }

    #[tokio::test]
    async fn test_search_scoped_to_base() {
        let directory = InMemoryDirectory::new("dc=example");
        directory.add_entry(person("alice")).await;
        directory
            .add_entry(
                DirectoryEntry::new("cn=admins,ou=groups,dc=example", HashMap::new())
                    .with_attr("cn", "admins"),
            )
            .await;

        let all = directory.search("", &Filter::present("objectClass")).await.unwrap();
        assert_eq!(all.len(), 1);

        let groups = directory.search("ou=groups", &Filter::eq("cn", "admins")).await.unwrap();
        assert_eq!(groups.len(), 1);

        let none = directory.search("ou=groups", &Filter::eq("uid", "alice")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_and_remove() {
        let directory = InMemoryDirectory::new("dc=example");
        directory.add_entry(person("bob")).await;

        let dn = DistinguishedName::parse("UID=bob,ou=People").unwrap();
        assert!(directory.lookup(&dn).await.unwrap().is_some());

        assert!(directory.remove_entry("uid=bob,ou=people,dc=example").await);
        assert!(directory.lookup(&dn).await.unwrap().is_none());

        let stats = directory.stats().await;
        assert_eq!(stats.lookups, 2);
        assert_eq!(stats.entry_count, 0);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let directory = InMemoryDirectory::new("dc=example");
        directory.set_available(false);
        let result = directory.search("", &Filter::present("uid")).await;
        assert!(matches!(result, Err(DirectoryError::Unavailable { .. })));
    }
}
