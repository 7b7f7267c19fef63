//! Combining results from the local store and the directory.

use crate::identity::IdentityRecord;
use std::collections::HashSet;

/// Merge two result lists into one list with unique ids.
///
/// Every record of `primary` comes first, in its own order, and wins over any
/// record of `secondary` with the same id. Records of `secondary` follow in
/// their own order; repeated ids within `secondary` keep the first occurrence.
///
/// Ids compare case-sensitively. Repeated ids within `primary` are collapsed
/// the same way so the output never holds two records with one id.
///
/// ```rust
/// use federated_identity::{merge, IdentityRecord};
///
/// let local = vec![IdentityRecord::new("alice").with_display_name("Alice (local)")];
/// let directory = vec![
///     IdentityRecord::new("bob"),
///     IdentityRecord::new("alice").with_display_name("Alice (ldap)"),
///     IdentityRecord::new("bob"),
/// ];
///
/// let merged = merge(local, directory);
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged[0].display_name(), Some("Alice (local)"));
/// assert_eq!(merged[1].id, "bob");
/// ```
pub fn merge(primary: Vec<IdentityRecord>, secondary: Vec<IdentityRecord>) -> Vec<IdentityRecord> {
    let mut seen = HashSet::with_capacity(primary.len() + secondary.len());
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());
    for record in primary.into_iter().chain(secondary) {
        if seen.insert(record.id.clone()) {
            merged.push(record);
        }
    }
    merged
}

/// Apply an `offset`/`limit` window.
pub(crate) fn page(records: Vec<IdentityRecord>, offset: usize, limit: usize) -> Vec<IdentityRecord> {
    records.into_iter().skip(offset).take(limit).collect()
}
