//! Group membership resolution.
//!
//! A configured group lists its members in a multi-valued attribute. Members
//! are either login identifiers (`memberUid`), each resolved by a login id
//! search, or distinguished names, each resolved by reading the entry. The
//! per-member round-trips run through an ordered stream with a bounded number
//! of requests in flight, so results keep the group's listing order.
//!
//! Members that no longer resolve are dropped without error. Duplicates are
//! kept; callers deduplicate with [`merge`](crate::merge::merge).

use crate::config::{DirectoryConfig, GroupSpec, MembershipKind};
use crate::directory::{
    DirectoryEntry, DirectoryError, DirectoryQueryBuilder, DirectoryTransport, DistinguishedName,
};
use crate::error::IdentityResult;
use crate::identity::IdentityRecord;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, trace, warn};
use std::collections::HashSet;

/// Resolves a group's members into identity records.
pub struct DirectoryGroupResolver<'a, D: DirectoryTransport> {
    transport: &'a D,
    config: &'a DirectoryConfig,
}

impl<'a, D: DirectoryTransport> DirectoryGroupResolver<'a, D> {
    pub fn new(transport: &'a D, config: &'a DirectoryConfig) -> Self {
        Self { transport, config }
    }

    /// Resolve the members of `spec`.
    ///
    /// * `keyword` - when non-empty, keep members whose name contains it
    ///   (case-insensitive); for reference members the RDN value named by
    ///   `spec.rdn_key` is tested before any lookup is made.
    /// * `allowed_ids` - when present, keep members whose login id is in the set.
    ///
    /// # Errors
    ///
    /// A member value that is not a valid DN fails the whole call with
    /// `MalformedReference`; transport failures are propagated.
    pub async fn resolve_group(
        &self,
        spec: &GroupSpec,
        keyword: &str,
        allowed_ids: Option<&HashSet<String>>,
    ) -> IdentityResult<Vec<IdentityRecord>> {
        let groups = self.transport.search(&spec.base, &spec.search).await?;
        let Some(group) = groups.first() else {
            debug!("Group search '{}' under '{}' matched no entry", spec.search, spec.base);
            return Ok(Vec::new());
        };
        if groups.len() > 1 {
            warn!(
                "Group search '{}' matched {} entries, using '{}'",
                spec.search,
                groups.len(),
                group.dn
            );
        }

        let members = group.get_attrs(&spec.membership_attribute);
        debug!(
            "Resolving {} members of '{}' ({:?} membership)",
            members.len(),
            group.dn,
            spec.membership_kind
        );

        let keyword = keyword.to_lowercase();
        let records = match spec.membership_kind {
            MembershipKind::Reference => self.resolve_references(spec, members, &keyword).await?,
            MembershipKind::DirectIdentifier => {
                self.resolve_identifiers(members, &keyword).await?
            }
        };

        Ok(records
            .into_iter()
            .filter(|record| allowed_ids.is_none_or(|allowed| allowed.contains(&record.id)))
            .collect())
    }

    async fn resolve_references(
        &self,
        spec: &GroupSpec,
        members: &[String],
        keyword: &str,
    ) -> IdentityResult<Vec<IdentityRecord>> {
        let base = DistinguishedName::parse(&self.config.base)?;

        let mut candidates = Vec::with_capacity(members.len());
        for member in members {
            let relative = DistinguishedName::parse(member)?.strip_suffix(&base);
            if !keyword.is_empty() {
                let matched = relative
                    .value_of(&spec.rdn_key)
                    .is_some_and(|value| value.to_lowercase().contains(keyword));
                if !matched {
                    trace!("Member '{}' does not match keyword, skipped", member);
                    continue;
                }
            }
            candidates.push(relative);
        }

        let transport = self.transport;
        let entries: Vec<_> = stream::iter(candidates)
            .map(|dn| async move {
                let entry = transport.lookup(&dn).await?;
                if entry.is_none() {
                    debug!("Member '{}' no longer exists, dropped", dn);
                }
                Ok::<_, DirectoryError>(entry)
            })
            .buffered(self.config.lookup_concurrency.max(1))
            .try_collect()
            .await?;

        Ok(entries
            .into_iter()
            .flatten()
            .filter_map(|entry| self.to_identity(&entry))
            .collect())
    }

    async fn resolve_identifiers(
        &self,
        members: &[String],
        keyword: &str,
    ) -> IdentityResult<Vec<IdentityRecord>> {
        let builder = DirectoryQueryBuilder::new(&self.config.mapping, &self.config.filter);
        let transport = self.transport;

        let found: Vec<_> = stream::iter(members.iter().cloned())
            .map(|login_id| {
                let filter = builder.login_id_only(&login_id);
                async move {
                    let mut entries = transport.search("", &filter).await?;
                    if entries.is_empty() {
                        debug!("Member '{}' no longer exists, dropped", login_id);
                    } else if entries.len() > 1 {
                        warn!(
                            "Member '{}' matched {} entries, using the first",
                            login_id,
                            entries.len()
                        );
                    }
                    Ok::<_, DirectoryError>(
                        (!entries.is_empty()).then(|| entries.swap_remove(0)),
                    )
                }
            })
            .buffered(self.config.lookup_concurrency.max(1))
            .try_collect()
            .await?;

        Ok(found
            .into_iter()
            .flatten()
            .filter_map(|entry| self.to_identity(&entry))
            .filter(|record| keyword.is_empty() || record.id.to_lowercase().contains(keyword))
            .collect())
    }

    fn to_identity(&self, entry: &DirectoryEntry) -> Option<IdentityRecord> {
        let record = entry.to_identity(&self.config.mapping);
        if record.is_none() {
            debug!(
                "Entry '{}' has no '{}' attribute, dropped",
                entry.dn, self.config.mapping.login_id
            );
        }
        record
    }
}
