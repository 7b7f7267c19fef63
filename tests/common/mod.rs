//! Shared fixtures for the integration tests.
//!
//! Builds a small directory under `dc=acme,dc=com` with people keyed by `cn`
//! and groups of either membership kind, plus a local store.

#![allow(dead_code)]

use federated_identity::config::{AttributeMapping, DirectoryConfig, GroupSpec};
use federated_identity::database::{InMemoryUserRepository, UserRow};
use federated_identity::directory::{DirectoryEntry, Filter, InMemoryDirectory};
use std::collections::HashMap;

pub const BASE: &str = "dc=acme,dc=com";

/// Install a test logger once; repeated calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A person whose RDN is its display name (`cn=<name>,ou=people,...`).
pub fn person(uid: &str, name: &str) -> DirectoryEntry {
    DirectoryEntry::new(person_dn(name), HashMap::new())
        .with_attr("objectClass", "inetOrgPerson")
        .with_attr("uid", uid)
        .with_attr("cn", name)
        .with_attr("mail", format!("{}@acme.com", uid))
}

pub fn person_dn(name: &str) -> String {
    format!("cn={},ou=people,{}", name, BASE)
}

/// A group listing its members by DN in `member`.
pub fn reference_group(name: &str, members: &[String]) -> DirectoryEntry {
    members.iter().fold(group_entry(name), |group, member| {
        group.with_attr("member", member.as_str())
    })
}

/// A group listing its members by login id in `memberUid`.
pub fn uid_group(name: &str, members: &[&str]) -> DirectoryEntry {
    members
        .iter()
        .fold(group_entry(name), |group, member| group.with_attr("memberUid", *member))
}

fn group_entry(name: &str) -> DirectoryEntry {
    DirectoryEntry::new(format!("cn={},ou=groups,{}", name, BASE), HashMap::new())
        .with_attr("objectClass", "groupOfNames")
        .with_attr("cn", name)
}

pub fn reference_spec(group: &str) -> GroupSpec {
    GroupSpec::new("ou=groups", Filter::eq("cn", group), "member", "cn")
}

pub fn uid_spec(group: &str) -> GroupSpec {
    GroupSpec::new("ou=groups", Filter::eq("cn", group), "memberUid", "")
}

pub fn directory_config() -> DirectoryConfig {
    DirectoryConfig::new(BASE, AttributeMapping::default()).with_lookup_concurrency(4)
}

pub async fn directory_with(entries: Vec<DirectoryEntry>) -> InMemoryDirectory {
    let directory = InMemoryDirectory::new(BASE);
    for entry in entries {
        directory.add_entry(entry).await;
    }
    directory
}

pub async fn repository_with(rows: Vec<UserRow>) -> InMemoryUserRepository {
    let repository = InMemoryUserRepository::new();
    for row in rows {
        repository.insert(row).await;
    }
    repository
}
