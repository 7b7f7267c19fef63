//! Deployment configuration.
//!
//! Configuration is read once at startup, validated, and then shared immutably
//! by every component. Two sources are supported:
//!
//! * a flat property map using the `attributeMapping.*`, `filter.*` and
//!   `group.*` keys (the `ldap.mapping.*`, `ldap.filter.*` and `ldap.group.*`
//!   spellings are accepted as aliases), see [`IdentityConfig::from_properties`];
//! * a JSON document matching the serde layout of [`IdentityConfig`].
//!
//! # Example Usage
//!
//! ```rust
//! use federated_identity::config::{BackendKind, IdentityConfig, MembershipKind};
//! use std::collections::HashMap;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let properties: HashMap<String, String> = [
//!     ("spring.profiles.active", "ldap"),
//!     ("spring.ldap.base", "dc=example,dc=org"),
//!     ("attributeMapping.loginId", "uid"),
//!     ("attributeMapping.displayName", "cn"),
//!     ("attributeMapping.email", "mail"),
//!     ("attributeMapping.objectClass", "inetOrgPerson"),
//!     ("filter.memberOf", "cn=ServiceDEV,ou=DEV,dc=example,dc=org|cn=ServiceOPS,ou=OPS,dc=example,dc=org"),
//!     ("group.search", "(&(cn=apollo-admins)(&(member=*)))"),
//!     ("group.membership", "member"),
//!     ("group.rdnKey", "uid"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//!
//! let config = IdentityConfig::from_properties(&properties)?;
//! assert_eq!(config.profile, BackendKind::Directory);
//! let group = config.directory.as_ref().and_then(|d| d.group.as_ref()).unwrap();
//! assert_eq!(group.membership_kind, MembershipKind::Reference);
//! # Ok(())
//! # }
//! ```

use crate::directory::{Filter, FilterParseError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Membership attribute holding direct login identifiers rather than references.
pub const MEMBER_UID_ATTRIBUTE: &str = "memberUid";

/// Attributes that may carry an allow-list in the flat property surface, in
/// the order their predicates are combined.
pub const FILTER_ATTRIBUTES: [&str; 5] = [
    "sAMAccountName",
    "description",
    "department",
    "division",
    "memberOf",
];

const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_LOOKUP_CONCURRENCY: usize = 8;
const DEFAULT_DISPLAY_NAME_RDN_KEY: &str = "cn";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required property is missing
    #[error("Missing required property '{key}'")]
    MissingProperty { key: String },

    /// A property has an invalid value
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The deployment profile is not recognized
    #[error("Unknown deployment profile '{profile}'")]
    UnknownProfile { profile: String },

    /// The group search expression is not a valid filter
    #[error("Invalid group search filter: {0}")]
    InvalidFilter(#[from] FilterParseError),

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    Validation { message: String },

    /// The selected backend needs a transport that was not supplied
    #[error("Backend '{backend}' requires a {transport} transport")]
    MissingTransport {
        backend: BackendKind,
        transport: &'static str,
    },

    /// JSON deserialization error
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl ConfigurationError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Which backend combination serves user lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// A single built-in account; no external store.
    #[default]
    Default,
    /// Local relational store only.
    #[serde(alias = "auth")]
    Database,
    /// Directory service with the local store consulted first.
    #[serde(alias = "ldap")]
    Directory,
    /// Directory service only.
    #[serde(alias = "ldap-only")]
    DirectoryOnly,
    /// Identities asserted by an upstream single sign-on service.
    #[serde(alias = "cas", alias = "sso")]
    PassThrough,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Default => "default",
            BackendKind::Database => "database",
            BackendKind::Directory => "directory",
            BackendKind::DirectoryOnly => "directory-only",
            BackendKind::PassThrough => "pass-through",
        }
    }

    pub fn requires_directory(&self) -> bool {
        matches!(self, BackendKind::Directory | BackendKind::DirectoryOnly)
    }

    pub fn requires_database(&self) -> bool {
        matches!(self, BackendKind::Database | BackendKind::Directory)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(BackendKind::Default),
            "auth" | "database" => Ok(BackendKind::Database),
            "ldap" | "directory" => Ok(BackendKind::Directory),
            "ldap-only" | "directory-only" => Ok(BackendKind::DirectoryOnly),
            "cas" | "sso" | "pass-through" => Ok(BackendKind::PassThrough),
            other => Err(ConfigurationError::UnknownProfile {
                profile: other.to_string(),
            }),
        }
    }
}

/// Which directory attribute plays which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMapping {
    pub login_id: String,
    pub display_name: String,
    pub email: String,
    /// Required value of the `objectClass` attribute for user entries.
    pub object_class: String,
}

impl AttributeMapping {
    pub fn new(
        login_id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        object_class: impl Into<String>,
    ) -> Self {
        Self {
            login_id: login_id.into(),
            display_name: display_name.into(),
            email: email.into(),
            object_class: object_class.into(),
        }
    }
}

impl Default for AttributeMapping {
    fn default() -> Self {
        Self::new("uid", "cn", "mail", "inetOrgPerson")
    }
}

/// Allowed values for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub attribute: String,
    pub values: Vec<String>,
}

/// Ordered allow-lists restricting attribute-based directory searches.
///
/// Entries are ANDed together, the values of one entry are ORed. An entry
/// with no values places no restriction on its attribute. Blank values are
/// dropped however the spec is built, deserialization included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FilterEntry>", into = "Vec<FilterEntry>")]
pub struct FilterSpec {
    entries: Vec<FilterEntry>,
}

impl From<Vec<FilterEntry>> for FilterSpec {
    fn from(entries: Vec<FilterEntry>) -> Self {
        entries
            .into_iter()
            .fold(FilterSpec::default(), |spec, entry| {
                spec.with_entry(entry.attribute, entry.values)
            })
    }
}

impl From<FilterSpec> for Vec<FilterEntry> {
    fn from(spec: FilterSpec) -> Self {
        spec.entries
    }
}

impl FilterSpec {
    /// Append an entry. Blank values are discarded.
    pub fn with_entry<I, S>(mut self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values
            .into_iter()
            .map(Into::into)
            .filter(|v: &String| !v.trim().is_empty())
            .collect();
        self.entries.push(FilterEntry {
            attribute: attribute.into(),
            values,
        });
        self
    }

    /// Append an entry from a `|`-delimited list; the empty string means no restriction.
    pub fn with_delimited(self, attribute: impl Into<String>, delimited: &str) -> Self {
        self.with_entry(attribute, delimited.split('|').map(str::trim))
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// Entries that actually restrict the search.
    pub fn active_entries(&self) -> impl Iterator<Item = &FilterEntry> {
        self.entries.iter().filter(|e| !e.values.is_empty())
    }
}

/// How a group's membership attribute encodes its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MembershipKind {
    /// Each value is a login identifier (`memberUid`).
    DirectIdentifier,
    /// Each value is a distinguished name that must be looked up (`member`, `uniqueMember`).
    Reference,
}

impl MembershipKind {
    /// Kind implied by the membership attribute name.
    pub fn for_attribute(attribute: &str) -> Self {
        if attribute == MEMBER_UID_ATTRIBUTE {
            MembershipKind::DirectIdentifier
        } else {
            MembershipKind::Reference
        }
    }
}

/// A directory group whose members are the searchable user population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSpec {
    /// Search base for the group entry, relative to the directory base.
    #[serde(default)]
    pub base: String,
    /// Filter selecting the group entry.
    pub search: Filter,
    /// Multi-valued attribute listing the members.
    pub membership_attribute: String,
    pub membership_kind: MembershipKind,
    /// RDN key whose value is matched against search keywords for reference members.
    #[serde(default)]
    pub rdn_key: String,
}

impl GroupSpec {
    /// Create a group spec, deriving the membership kind from the attribute name.
    pub fn new(
        base: impl Into<String>,
        search: Filter,
        membership_attribute: impl Into<String>,
        rdn_key: impl Into<String>,
    ) -> Self {
        let membership_attribute = membership_attribute.into();
        Self {
            base: base.into(),
            search,
            membership_kind: MembershipKind::for_attribute(&membership_attribute),
            membership_attribute,
            rdn_key: rdn_key.into(),
        }
    }

    pub fn with_membership_kind(mut self, kind: MembershipKind) -> Self {
        self.membership_kind = kind;
        self
    }
}

fn default_lookup_concurrency() -> usize {
    DEFAULT_LOOKUP_CONCURRENCY
}

fn default_display_name_rdn_key() -> String {
    DEFAULT_DISPLAY_NAME_RDN_KEY.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Directory-side settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConfig {
    /// Base DN of the directory connection.
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub mapping: AttributeMapping,
    #[serde(default)]
    pub filter: FilterSpec,
    /// When set, searches go through group membership instead of attribute filters.
    #[serde(default)]
    pub group: Option<GroupSpec>,
    /// Maximum in-flight per-member lookups during group resolution.
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,
    /// RDN key carrying the display name in a bound principal's DN.
    #[serde(default = "default_display_name_rdn_key")]
    pub display_name_rdn_key: String,
}

impl DirectoryConfig {
    pub fn new(base: impl Into<String>, mapping: AttributeMapping) -> Self {
        Self {
            base: base.into(),
            mapping,
            filter: FilterSpec::default(),
            group: None,
            lookup_concurrency: DEFAULT_LOOKUP_CONCURRENCY,
            display_name_rdn_key: DEFAULT_DISPLAY_NAME_RDN_KEY.to_string(),
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_group(mut self, group: GroupSpec) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_lookup_concurrency(mut self, concurrency: usize) -> Self {
        self.lookup_concurrency = concurrency;
        self
    }
}

/// Local relational store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Rows returned by a search when the caller passes no limit.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Complete identity-resolution configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConfig {
    #[serde(default)]
    pub profile: BackendKind,
    #[serde(default)]
    pub directory: Option<DirectoryConfig>,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl IdentityConfig {
    pub fn new(profile: BackendKind) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    pub fn with_directory(mut self, directory: DirectoryConfig) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.database.page_size = page_size;
        self
    }

    /// Load and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: IdentityConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a flat property map.
    pub fn from_properties(
        properties: &HashMap<String, String>,
    ) -> Result<Self, ConfigurationError> {
        let props = Properties(properties);

        let profile = match props.get(&["profile"]) {
            Some(explicit) => explicit.parse()?,
            None => props
                .get(&["spring.profiles.active"])
                .map(|active| {
                    active
                        .split(',')
                        .find_map(|p| p.parse::<BackendKind>().ok())
                        .unwrap_or_default()
                })
                .unwrap_or_default(),
        };

        let directory = if profile.requires_directory() || props.has_prefix("attributeMapping.") {
            Some(Self::directory_from_properties(&props)?)
        } else {
            None
        };

        let mut database = DatabaseConfig::default();
        if let Some(raw) = props.get(&["database.pageSize"]) {
            database.page_size = parse_number("database.pageSize", raw)?;
        }

        let config = Self {
            profile,
            directory,
            database,
        };
        config.validate()?;
        Ok(config)
    }

    fn directory_from_properties(props: &Properties<'_>) -> Result<DirectoryConfig, ConfigurationError> {
        let defaults = AttributeMapping::default();
        let mapping = AttributeMapping {
            login_id: props
                .get(&["attributeMapping.loginId", "ldap.mapping.loginId"])
                .unwrap_or(defaults.login_id.as_str())
                .to_string(),
            display_name: props
                .get(&[
                    "attributeMapping.displayName",
                    "ldap.mapping.userDisplayName",
                ])
                .unwrap_or(defaults.display_name.as_str())
                .to_string(),
            email: props
                .get(&["attributeMapping.email", "ldap.mapping.email"])
                .unwrap_or(defaults.email.as_str())
                .to_string(),
            object_class: props
                .get(&["attributeMapping.objectClass", "ldap.mapping.objectClass"])
                .unwrap_or(defaults.object_class.as_str())
                .to_string(),
        };

        let mut filter = FilterSpec::default();
        for attribute in FILTER_ATTRIBUTES {
            let spec_key = format!("filter.{}", attribute);
            let alias_key = format!("ldap.filter.{}", attribute);
            let delimited = props
                .get(&[spec_key.as_str(), alias_key.as_str()])
                .unwrap_or("");
            filter = filter.with_delimited(attribute, delimited);
        }

        let mut directory = DirectoryConfig::new(
            props.get(&["directory.base", "spring.ldap.base"]).unwrap_or(""),
            mapping,
        )
        .with_filter(filter);

        let group_search = props
            .get(&["group.search", "ldap.group.groupSearch"])
            .unwrap_or("");
        if !group_search.trim().is_empty() {
            let membership = props
                .get(&["group.membership", "ldap.group.groupMembership"])
                .ok_or_else(|| ConfigurationError::MissingProperty {
                    key: "group.membership".to_string(),
                })?;
            let rdn_key = props
                .get(&["group.rdnKey", "ldap.group.rdnKey", "ldap.mapping.rdnKey"])
                .unwrap_or("");
            let mut group = GroupSpec::new(
                props
                    .get(&["group.base", "ldap.group.groupBase"])
                    .unwrap_or(""),
                Filter::parse(group_search)?,
                membership,
                rdn_key,
            );
            if let Some(kind) = props.get(&["group.membershipKind"]) {
                group = group.with_membership_kind(match kind {
                    "direct-identifier" => MembershipKind::DirectIdentifier,
                    "reference" => MembershipKind::Reference,
                    other => {
                        return Err(ConfigurationError::InvalidValue {
                            key: "group.membershipKind".to_string(),
                            message: format!("unknown membership kind '{}'", other),
                        });
                    }
                });
            }
            directory = directory.with_group(group);
        }

        if let Some(raw) = props.get(&["group.lookupConcurrency"]) {
            directory.lookup_concurrency = parse_number("group.lookupConcurrency", raw)?;
        }
        if let Some(key) = props.get(&["attributeMapping.displayNameRdnKey"]) {
            directory.display_name_rdn_key = key.to_string();
        }

        Ok(directory)
    }

    /// Validate the configuration for consistency.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.database.page_size == 0 {
            return Err(ConfigurationError::validation(
                "Database page size must be greater than 0",
            ));
        }

        if self.profile.requires_directory() && self.directory.is_none() {
            return Err(ConfigurationError::validation(format!(
                "Profile '{}' requires directory settings",
                self.profile
            )));
        }

        if let Some(directory) = &self.directory {
            let mapping = &directory.mapping;
            for (name, value) in [
                ("loginId", &mapping.login_id),
                ("displayName", &mapping.display_name),
                ("email", &mapping.email),
                ("objectClass", &mapping.object_class),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigurationError::validation(format!(
                        "Attribute mapping '{}' cannot be empty",
                        name
                    )));
                }
            }

            if directory.lookup_concurrency == 0 {
                return Err(ConfigurationError::validation(
                    "Lookup concurrency must be greater than 0",
                ));
            }

            if let Some(group) = &directory.group {
                if group.membership_attribute.trim().is_empty() {
                    return Err(ConfigurationError::validation(
                        "Group membership attribute cannot be empty",
                    ));
                }
                if group.membership_kind == MembershipKind::Reference
                    && group.rdn_key.trim().is_empty()
                {
                    return Err(ConfigurationError::validation(
                        "Reference membership requires an RDN key",
                    ));
                }
            }
        }

        Ok(())
    }
}

struct Properties<'a>(&'a HashMap<String, String>);

impl<'a> Properties<'a> {
    /// First present key wins.
    fn get(&self, keys: &[&str]) -> Option<&'a str> {
        keys.iter()
            .find_map(|key| self.0.get(*key))
            .map(|value| value.as_str())
    }

    fn has_prefix(&self, prefix: &str) -> bool {
        self.0.keys().any(|key| key.starts_with(prefix))
    }
}

fn parse_number(key: &str, raw: &str) -> Result<usize, ConfigurationError> {
    raw.trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigurationError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("auth".parse::<BackendKind>().unwrap(), BackendKind::Database);
        assert_eq!("LDAP".parse::<BackendKind>().unwrap(), BackendKind::Directory);
        assert_eq!("cas".parse::<BackendKind>().unwrap(), BackendKind::PassThrough);
        assert!(matches!(
            "ctrip-internal".parse::<BackendKind>(),
            Err(ConfigurationError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn test_active_profiles_pick_first_recognized() {
        let config =
            IdentityConfig::from_properties(&props(&[("spring.profiles.active", "github,auth")]))
                .unwrap();
        assert_eq!(config.profile, BackendKind::Database);
        assert!(config.directory.is_none());

        let config = IdentityConfig::from_properties(&props(&[])).unwrap();
        assert_eq!(config.profile, BackendKind::Default);
    }

    #[test]
    fn test_filter_properties_split_and_skip_empty() {
        let config = IdentityConfig::from_properties(&props(&[
            ("profile", "ldap"),
            ("ldap.filter.department", "R&D|Ops"),
            ("ldap.filter.memberOf", ""),
        ]))
        .unwrap();
        let directory = config.directory.unwrap();
        assert_eq!(directory.filter.entries().len(), FILTER_ATTRIBUTES.len());
        let active: Vec<_> = directory.filter.active_entries().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].attribute, "department");
        assert_eq!(active[0].values, vec!["R&D", "Ops"]);
        assert!(directory.group.is_none());
    }

    #[test]
    fn test_group_properties() {
        let config = IdentityConfig::from_properties(&props(&[
            ("profile", "ldap"),
            ("ldap.group.groupBase", "ou=group"),
            ("ldap.group.groupSearch", "(&(cn=apollo-admins)(&(memberUid=*)))"),
            ("ldap.group.groupMembership", "memberUid"),
        ]))
        .unwrap();
        let group = config.directory.unwrap().group.unwrap();
        assert_eq!(group.base, "ou=group");
        assert_eq!(group.membership_kind, MembershipKind::DirectIdentifier);
    }

    #[test]
    fn test_invalid_group_configuration() {
        let missing_membership = IdentityConfig::from_properties(&props(&[
            ("profile", "ldap"),
            ("group.search", "(cn=admins)"),
        ]));
        assert!(matches!(
            missing_membership,
            Err(ConfigurationError::MissingProperty { .. })
        ));

        let bad_filter = IdentityConfig::from_properties(&props(&[
            ("profile", "ldap"),
            ("group.search", "(cn=admins"),
            ("group.membership", "member"),
        ]));
        assert!(matches!(bad_filter, Err(ConfigurationError::InvalidFilter(_))));

        let missing_rdn = IdentityConfig::from_properties(&props(&[
            ("profile", "ldap"),
            ("group.search", "(cn=admins)"),
            ("group.membership", "member"),
        ]));
        assert!(matches!(missing_rdn, Err(ConfigurationError::Validation { .. })));
    }

    #[test]
    fn test_json_configuration() {
        let config = IdentityConfig::from_json(
            r#"{
                "profile": "ldap",
                "directory": {
                    "base": "dc=example,dc=org",
                    "mapping": {
                        "loginId": "sAMAccountName",
                        "displayName": "displayName",
                        "email": "mail",
                        "objectClass": "user"
                    },
                    "filter": [{ "attribute": "department", "values": ["R&D"] }],
                    "group": {
                        "base": "ou=groups",
                        "search": "(cn=apollo)",
                        "membershipAttribute": "member",
                        "membershipKind": "reference",
                        "rdnKey": "cn"
                    }
                },
                "database": { "pageSize": 50 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.profile, BackendKind::Directory);
        assert_eq!(config.database.page_size, 50);
        let directory = config.directory.unwrap();
        assert_eq!(directory.lookup_concurrency, 8);
        assert_eq!(directory.mapping.login_id, "sAMAccountName");
        assert_eq!(directory.group.unwrap().search, Filter::eq("cn", "apollo"));
    }

    #[test]
    fn test_json_filter_blank_values_add_no_restriction() {
        let config = IdentityConfig::from_json(
            r#"{
                "profile": "ldap-only",
                "directory": {
                    "base": "dc=example,dc=org",
                    "mapping": {
                        "loginId": "uid",
                        "displayName": "cn",
                        "email": "mail",
                        "objectClass": "inetOrgPerson"
                    },
                    "filter": [
                        { "attribute": "memberOf", "values": [""] },
                        { "attribute": "department", "values": ["  ", "eng"] }
                    ]
                }
            }"#,
        )
        .unwrap();

        let directory = config.directory.unwrap();
        assert!(directory.filter.entries()[0].values.is_empty());
        assert_eq!(directory.filter.entries()[1].values, vec!["eng".to_string()]);

        let query = crate::directory::DirectoryQueryBuilder::new(&directory.mapping, &directory.filter)
            .build("");
        assert_eq!(query.to_string(), "(&(objectClass=inetOrgPerson)(department=eng))");

        let round_trip: FilterSpec =
            serde_json::from_value(serde_json::to_value(&directory.filter).unwrap()).unwrap();
        assert_eq!(round_trip, directory.filter);
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let config = IdentityConfig::new(BackendKind::Database).with_page_size(0);
        assert!(config.validate().is_err());

        let config = IdentityConfig::new(BackendKind::DirectoryOnly).with_directory(
            DirectoryConfig::new("", AttributeMapping::default()).with_lookup_concurrency(0),
        );
        assert!(config.validate().is_err());

        assert!(IdentityConfig::new(BackendKind::Directory).validate().is_err());
    }
}
