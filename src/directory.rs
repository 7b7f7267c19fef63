//! Directory-service access: filters, distinguished names, query building and
//! group membership resolution.
//!
//! The directory protocol itself is an external collaborator. This module only
//! consumes it through the [`DirectoryTransport`] trait, which a deployment
//! implements over its LDAP client of choice. [`InMemoryDirectory`] is a
//! reference implementation for tests and development.
//!
//! # Example Usage
//!
//! ```rust
//! use federated_identity::config::{AttributeMapping, FilterSpec};
//! use federated_identity::directory::DirectoryQueryBuilder;
//!
//! let mapping = AttributeMapping::new("uid", "cn", "mail", "inetOrgPerson");
//! let filter = FilterSpec::default().with_entry("department", ["R&D", "Ops"]);
//! let builder = DirectoryQueryBuilder::new(&mapping, &filter);
//!
//! assert_eq!(
//!     builder.build("bo").to_string(),
//!     "(&(objectClass=inetOrgPerson)(|(department=R&D)(department=Ops))(|(uid=bo*)(cn=bo*)))"
//! );
//! ```

pub mod dn;
pub mod filter;
pub mod group;
pub mod in_memory;
pub mod query;

pub use dn::{DistinguishedName, Rdn};
pub use filter::{Filter, FilterParseError};
pub use group::DirectoryGroupResolver;
pub use in_memory::InMemoryDirectory;
pub use query::DirectoryQueryBuilder;

use crate::config::AttributeMapping;
use crate::identity::IdentityRecord;
use std::collections::HashMap;
use std::future::Future;

/// Errors reported by a directory transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    /// The directory could not be reached or the connection failed mid-operation
    #[error("Directory unavailable: {message}")]
    Unavailable { message: String },

    /// The server rejected the operation
    #[error("Directory operation '{operation}' failed: {message}")]
    OperationFailed { operation: String, message: String },
}

impl DirectoryError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn operation_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// A directory entry with its (multi-valued) attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name, as returned by the server.
    pub dn: String,

    /// Attributes; every attribute is multi-valued.
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>, attributes: HashMap<String, Vec<String>>) -> Self {
        Self {
            dn: dn.into(),
            attributes,
        }
    }

    /// Add a value to an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// All values of an attribute. Attribute names compare case-insensitively.
    pub fn get_attrs(&self, name: &str) -> &[String] {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// First value of an attribute.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.get_attrs(name).first().map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        !self.get_attrs(name).is_empty()
    }

    /// Map the entry through the attribute mapping.
    ///
    /// Missing display name or email attributes leave those fields absent.
    /// An entry without a login id has no canonical identity and yields `None`.
    pub fn to_identity(&self, mapping: &AttributeMapping) -> Option<IdentityRecord> {
        let id = self.get_attr(&mapping.login_id)?;
        Some(IdentityRecord {
            id: id.to_string(),
            display_name: self.get_attr(&mapping.display_name).map(str::to_string),
            email: self.get_attr(&mapping.email).map(str::to_string),
        })
    }
}

/// Search and lookup capability of a directory service.
///
/// Implementations own connection handling, pooling and TLS. Both operations
/// are read-only; the core never retries or times them out.
pub trait DirectoryTransport: Send + Sync {
    /// Subtree search below `base` (relative to the connection's base DN;
    /// the empty string is the connection base itself).
    fn search(
        &self,
        base: &str,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<DirectoryEntry>, DirectoryError>> + Send;

    /// Read the entry at `dn` (relative to the connection's base DN).
    ///
    /// Returns `None` when no such entry exists.
    fn lookup(
        &self,
        dn: &DistinguishedName,
    ) -> impl Future<Output = Result<Option<DirectoryEntry>, DirectoryError>> + Send;
}
