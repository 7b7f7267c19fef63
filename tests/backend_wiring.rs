//! Configuration loading and backend selection, exercised through the
//! public entry points only.

mod common;

use common::*;
use federated_identity::config::{BackendKind, ConfigurationError, IdentityConfig};
use federated_identity::database::{InMemoryUserRepository, UserRow};
use federated_identity::directory::InMemoryDirectory;
use federated_identity::{
    Backend, BackendSelector, IdentityError, Principal, UserService, WiredBackend,
};
use std::collections::HashMap;

type Wired = WiredBackend<InMemoryDirectory, InMemoryUserRepository>;

fn properties(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn ldap_profile_from_properties() {
    init_logging();
    let props = properties(&[
        ("spring.profiles.active", "github,ldap"),
        ("spring.ldap.base", BASE),
        ("ldap.mapping.loginId", "uid"),
        ("ldap.mapping.userDisplayName", "cn"),
        ("ldap.mapping.email", "mail"),
        ("ldap.mapping.objectClass", "inetOrgPerson"),
        ("ldap.group.groupBase", "ou=groups"),
        ("ldap.group.groupSearch", "(cn=portal-users)"),
        ("ldap.group.groupMembership", "member"),
        ("ldap.group.rdnKey", "cn"),
    ]);
    let config = IdentityConfig::from_properties(&props).unwrap();
    assert_eq!(config.profile, BackendKind::Directory);

    let directory = directory_with(vec![
        person("bob-smith", "Bob Smith"),
        person("outsider", "Out Sider"),
        reference_group("portal-users", &[person_dn("Bob Smith")]),
    ])
    .await;
    let repository = repository_with(vec![UserRow::new("admin")]).await;
    let wired: Wired = BackendSelector::select(&config, Some(directory), Some(repository)).unwrap();
    assert!(matches!(wired.service, Backend::Directory(_)));

    let found = wired.service.search("smith", 0, 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(wired.service.find_by_id("outsider").await.unwrap().is_none());
    assert!(wired.service.find_by_id("admin").await.unwrap().is_some());

    let caller = wired.extractor.extract(&Principal::directory(
        "bob-smith",
        &person_dn("Bob Smith"),
    ));
    assert_eq!(caller.display_name(), Some("Bob Smith"));
}

#[tokio::test]
async fn json_config_round_trips_through_selection() {
    let json = r#"{
        "profile": "ldap-only",
        "directory": {
            "base": "dc=acme,dc=com",
            "mapping": {
                "loginId": "uid",
                "displayName": "cn",
                "email": "mail",
                "objectClass": "inetOrgPerson"
            },
            "filter": [
                { "attribute": "department", "values": [] }
            ],
            "lookupConcurrency": 2
        },
        "database": { "pageSize": 1 }
    }"#;
    let config = IdentityConfig::from_json(json).unwrap();
    assert_eq!(config.profile, BackendKind::DirectoryOnly);

    let directory = directory_with(vec![
        person("alice", "Alice Doe"),
        person("alfred", "Alfred Roe"),
    ])
    .await;
    let wired: Wired = BackendSelector::select(&config, Some(directory), None).unwrap();

    let page = wired.service.search("al", 0, 0).await.unwrap();
    assert_eq!(page.len(), 1);
    let next = wired.service.search("al", 1, 0).await.unwrap();
    assert_eq!(next.len(), 1);
    assert_ne!(page[0].id, next[0].id);
}

#[tokio::test]
async fn sso_profile_accepts_asserted_users() {
    let config = IdentityConfig::from_properties(&properties(&[("spring.profiles.active", "cas")]))
        .unwrap();
    let repository = repository_with(vec![
        UserRow::new("grace").with_display_name("Grace").with_email("grace@acme.com"),
    ])
    .await;
    repository.grant("grace", ["ROLE_user"]).await;

    let wired: Wired = BackendSelector::select(&config, None, Some(repository)).unwrap();
    assert_eq!(wired.kind(), BackendKind::PassThrough);

    let stranger = wired.service.find_by_id("heidi").await.unwrap().unwrap();
    assert_eq!(stranger.display_name(), None);

    let loader = wired.account_loader.as_ref().unwrap();
    let principal = loader.load("grace").await.unwrap().unwrap();
    let caller = wired.extractor.extract(&principal);
    assert_eq!(caller.email(), Some("grace@acme.com"));
    assert!(loader.load("heidi").await.unwrap().is_none());
}

#[test]
fn unknown_profile_is_rejected() {
    let err = IdentityConfig::from_properties(&properties(&[("profile", "kerberos")])).unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownProfile { .. }));
}

#[test]
fn database_profile_without_repository_is_rejected() {
    let config = IdentityConfig::new(BackendKind::Database);
    let result: Result<Wired, IdentityError> = BackendSelector::select(&config, None, None);
    assert!(matches!(
        result,
        Err(IdentityError::Configuration(ConfigurationError::MissingTransport {
            backend: BackendKind::Database,
            ..
        }))
    ));
}

#[tokio::test]
async fn default_profile_serves_builtin_account() {
    let wired: Wired = BackendSelector::select(&IdentityConfig::default(), None, None).unwrap();
    let found = wired.service.search("", 0, 0).await.unwrap();
    assert_eq!(found[0].id, "apollo");
    let ids = vec!["apollo".to_string()];
    assert_eq!(wired.service.find_by_ids(&ids).await.unwrap().len(), 1);
}
