//! Federated identity resolution for Rust.
//!
//! Provides one async contract for searching and resolving users, whether they
//! live in a local relational store, in a directory service (queried by
//! attribute filter or through group membership), or are asserted by an
//! upstream single sign-on server. Also maps the authenticated principal of
//! any of those mechanisms to one canonical [`IdentityRecord`].
//!
//! # Core Components
//!
//! - [`UserService`] - Search and lookup contract, one strategy per backend
//! - [`BackendSelector`] - Wires the strategy for a deployment profile
//! - [`PrincipalExtractor`] - Canonical identity of the current caller
//! - [`DirectoryTransport`] / [`UserRepository`] - Traits for the external
//!   directory and database clients
//!
//! # Quick Start
//!
//! ```rust
//! use federated_identity::config::{AttributeMapping, BackendKind, DirectoryConfig, IdentityConfig};
//! use federated_identity::database::{InMemoryUserRepository, UserRow};
//! use federated_identity::directory::{DirectoryEntry, InMemoryDirectory};
//! use federated_identity::{BackendSelector, UserService};
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new("dc=acme,dc=com");
//! directory
//!     .add_entry(
//!         DirectoryEntry::new("uid=bob,ou=people,dc=acme,dc=com", HashMap::new())
//!             .with_attr("objectClass", "inetOrgPerson")
//!             .with_attr("uid", "bob")
//!             .with_attr("cn", "Bob"),
//!     )
//!     .await;
//! let repository = InMemoryUserRepository::new();
//! repository.insert(UserRow::new("alice")).await;
//!
//! let config = IdentityConfig::new(BackendKind::Directory)
//!     .with_directory(DirectoryConfig::new("dc=acme,dc=com", AttributeMapping::default()));
//! let wired = BackendSelector::select(&config, Some(directory), Some(repository))?;
//!
//! assert!(wired.service.find_by_id("alice").await?.is_some());
//! assert!(wired.service.find_by_id("bob").await?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod directory;
pub mod error;
pub mod identity;
pub mod merge;
pub mod principal;
pub mod selector;
pub mod service;

// Re-export commonly used types for convenience
pub use config::{BackendKind, IdentityConfig};
pub use database::{DatabaseUserStore, UserRepository};
pub use directory::{DirectoryTransport, Filter};
pub use error::{IdentityError, IdentityResult};
pub use identity::IdentityRecord;
pub use merge::merge;
pub use principal::{LocalAccountLoader, Principal, PrincipalExtractor};
pub use selector::{Backend, BackendSelector, WiredBackend};
pub use service::UserService;
