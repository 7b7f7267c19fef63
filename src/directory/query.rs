//! Attribute-based user search filters.

use crate::config::{AttributeMapping, FilterSpec};
use crate::directory::Filter;

/// Attribute every user entry is matched on.
pub const OBJECT_CLASS_ATTRIBUTE: &str = "objectClass";

/// Builds user search filters from the attribute mapping and allow-lists.
///
/// Building never performs I/O; the result is handed to a
/// [`DirectoryTransport`](crate::directory::DirectoryTransport).
#[derive(Debug, Clone, Copy)]
pub struct DirectoryQueryBuilder<'a> {
    mapping: &'a AttributeMapping,
    filter: &'a FilterSpec,
}

impl<'a> DirectoryQueryBuilder<'a> {
    pub fn new(mapping: &'a AttributeMapping, filter: &'a FilterSpec) -> Self {
        Self { mapping, filter }
    }

    /// Object class predicate plus one OR-group per restricting allow-list.
    fn base(&self) -> Filter {
        self.filter.active_entries().fold(
            Filter::eq(OBJECT_CLASS_ATTRIBUTE, self.mapping.object_class.as_str()),
            |query, entry| match Filter::any_of(&entry.attribute, entry.values.iter().cloned()) {
                Some(allowed) => query.and(allowed),
                None => query,
            },
        )
    }

    /// Search filter for a free-text keyword.
    ///
    /// A non-empty keyword must prefix either the login id or the display
    /// name. With no keyword and no allow-lists the result matches every entry
    /// of the configured object class.
    pub fn build(&self, keyword: &str) -> Filter {
        let query = self.base();
        if keyword.is_empty() {
            return query;
        }
        query.and(
            Filter::starts_with(self.mapping.login_id.as_str(), keyword)
                .or(Filter::starts_with(self.mapping.display_name.as_str(), keyword)),
        )
    }

    /// Search filter for exactly one login id.
    pub fn by_login_id(&self, login_id: &str) -> Filter {
        self.base()
            .and(Filter::eq(self.mapping.login_id.as_str(), login_id))
    }

    /// Search filter for any of the given login ids; `None` when `ids` is empty.
    pub fn by_login_ids<S: AsRef<str>>(&self, ids: &[S]) -> Option<Filter> {
        Filter::any_of(
            &self.mapping.login_id,
            ids.iter().map(|id| id.as_ref().to_string()),
        )
        .map(|ids| self.base().and(ids))
    }

    /// Unrestricted login id match, used to resolve direct group members.
    pub fn login_id_only(&self, login_id: &str) -> Filter {
        Filter::eq(self.mapping.login_id.as_str(), login_id)
    }
}
