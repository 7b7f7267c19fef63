//! Built-in single-account backend, used when no authentication backend is
//! configured.

use crate::error::IdentityResult;
use crate::identity::IdentityRecord;
use crate::service::{SearchWindow, UserService};

pub const DEFAULT_USER_ID: &str = "apollo";
pub const DEFAULT_USER_NAME: &str = "apollo";
pub const DEFAULT_USER_EMAIL: &str = "apollo@acme.com";

/// Serves one fixed account for every search.
#[derive(Debug, Clone)]
pub struct StaticUserService {
    account: IdentityRecord,
}

impl StaticUserService {
    pub fn new() -> Self {
        Self::with_account(
            IdentityRecord::new(DEFAULT_USER_ID)
                .with_display_name(DEFAULT_USER_NAME)
                .with_email(DEFAULT_USER_EMAIL),
        )
    }

    pub fn with_account(account: IdentityRecord) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &IdentityRecord {
        &self.account
    }
}

impl Default for StaticUserService {
    fn default() -> Self {
        Self::new()
    }
}

impl UserService for StaticUserService {
    /// The keyword is ignored; the window still applies.
    async fn search(
        &self,
        _keyword: &str,
        offset: usize,
        limit: usize,
    ) -> IdentityResult<Vec<IdentityRecord>> {
        Ok(SearchWindow::new(offset, limit, 1).apply(vec![self.account.clone()]))
    }

    async fn find_by_id(&self, id: &str) -> IdentityResult<Option<IdentityRecord>> {
        Ok((id == self.account.id).then(|| self.account.clone()))
    }

    async fn find_by_ids(&self, ids: &[String]) -> IdentityResult<Vec<IdentityRecord>> {
        if ids.iter().any(|id| *id == self.account.id) {
            Ok(vec![self.account.clone()])
        } else {
            Ok(Vec::new())
        }
    }
}
