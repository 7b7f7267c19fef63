//! Startup wiring of the user service for a deployment profile.
//!
//! Selection happens once, from an [`IdentityConfig`] and whichever transports
//! the deployment provides. The result is a [`Backend`] (a closed enum over
//! the concrete services) together with the [`PrincipalExtractor`] matching
//! it, plus a [`LocalAccountLoader`] when a local store is available.
//!
//! # Example Usage
//!
//! ```rust
//! use federated_identity::config::{BackendKind, IdentityConfig};
//! use federated_identity::database::InMemoryUserRepository;
//! use federated_identity::directory::InMemoryDirectory;
//! use federated_identity::selector::BackendSelector;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IdentityConfig::new(BackendKind::Database);
//! let wired = BackendSelector::select::<InMemoryDirectory, _>(
//!     &config,
//!     None,
//!     Some(InMemoryUserRepository::new()),
//! )?;
//! assert_eq!(wired.kind(), BackendKind::Database);
//! # Ok(())
//! # }
//! ```

use crate::config::{BackendKind, ConfigurationError, IdentityConfig};
use crate::database::{DatabaseUserStore, UserRepository};
use crate::directory::DirectoryTransport;
use crate::error::IdentityResult;
use crate::identity::IdentityRecord;
use crate::principal::{LocalAccountLoader, PrincipalExtractor};
use crate::service::{
    DatabaseUserService, DirectoryUserService, PassThroughUserService, StaticUserService,
    UserService,
};
use log::info;

/// The user service chosen for this deployment.
#[derive(Debug, Clone)]
pub enum Backend<D: DirectoryTransport, R: UserRepository> {
    Static(StaticUserService),
    Database(DatabaseUserService<R>),
    Directory(DirectoryUserService<D, R>),
    PassThrough(PassThroughUserService<R>),
}

impl<D: DirectoryTransport, R: UserRepository> UserService for Backend<D, R> {
    async fn search(
        &self,
        keyword: &str,
        offset: usize,
        limit: usize,
    ) -> IdentityResult<Vec<IdentityRecord>> {
        match self {
            Backend::Static(service) => service.search(keyword, offset, limit).await,
            Backend::Database(service) => service.search(keyword, offset, limit).await,
            Backend::Directory(service) => service.search(keyword, offset, limit).await,
            Backend::PassThrough(service) => service.search(keyword, offset, limit).await,
        }
    }

    async fn find_by_id(&self, id: &str) -> IdentityResult<Option<IdentityRecord>> {
        match self {
            Backend::Static(service) => service.find_by_id(id).await,
            Backend::Database(service) => service.find_by_id(id).await,
            Backend::Directory(service) => service.find_by_id(id).await,
            Backend::PassThrough(service) => service.find_by_id(id).await,
        }
    }

    async fn find_by_ids(&self, ids: &[String]) -> IdentityResult<Vec<IdentityRecord>> {
        match self {
            Backend::Static(service) => service.find_by_ids(ids).await,
            Backend::Database(service) => service.find_by_ids(ids).await,
            Backend::Directory(service) => service.find_by_ids(ids).await,
            Backend::PassThrough(service) => service.find_by_ids(ids).await,
        }
    }
}

/// Everything the authentication layer needs from this crate.
#[derive(Debug, Clone)]
pub struct WiredBackend<D: DirectoryTransport, R: UserRepository> {
    kind: BackendKind,
    pub service: Backend<D, R>,
    pub extractor: PrincipalExtractor,
    pub account_loader: Option<LocalAccountLoader<R>>,
}

impl<D: DirectoryTransport, R: UserRepository> WiredBackend<D, R> {
    pub fn kind(&self) -> BackendKind {
        self.kind
    }
}

/// Composition root for identity resolution.
pub struct BackendSelector;

impl BackendSelector {
    /// Wire the backend named by `config.profile`.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or a transport the profile
    /// depends on was not supplied.
    pub fn select<D, R>(
        config: &IdentityConfig,
        directory: Option<D>,
        repository: Option<R>,
    ) -> IdentityResult<WiredBackend<D, R>>
    where
        D: DirectoryTransport,
        R: UserRepository + Clone,
    {
        config.validate()?;
        let kind = config.profile;
        let page_size = config.database.page_size;

        if kind.requires_directory() && directory.is_none() {
            return Err(ConfigurationError::MissingTransport {
                backend: kind,
                transport: "directory",
            }
            .into());
        }
        if kind.requires_database() && repository.is_none() {
            return Err(ConfigurationError::MissingTransport {
                backend: kind,
                transport: "database",
            }
            .into());
        }

        let store = match kind {
            BackendKind::Database | BackendKind::Directory | BackendKind::PassThrough => {
                repository.map(DatabaseUserStore::new)
            }
            BackendKind::Default | BackendKind::DirectoryOnly => None,
        };

        let mut extractor = PrincipalExtractor::default();
        let service = match (kind, store.clone(), directory) {
            (BackendKind::Default, _, _) => Backend::Static(StaticUserService::new()),
            (BackendKind::Database, Some(store), _) => {
                Backend::Database(DatabaseUserService::new(store, page_size))
            }
            (BackendKind::Directory | BackendKind::DirectoryOnly, local, Some(transport)) => {
                let directory_config = config.directory.clone().ok_or_else(|| {
                    ConfigurationError::MissingProperty {
                        key: "directory".to_string(),
                    }
                })?;
                extractor = PrincipalExtractor::for_directory(&directory_config);
                let service = DirectoryUserService::new(transport, directory_config, page_size);
                Backend::Directory(match local {
                    Some(store) => service.with_local_store(store),
                    None => service,
                })
            }
            (BackendKind::PassThrough, local, _) => {
                let service = PassThroughUserService::new(page_size);
                Backend::PassThrough(match local {
                    Some(store) => service.with_local_store(store),
                    None => service,
                })
            }
            (backend, _, _) => {
                return Err(ConfigurationError::MissingTransport {
                    backend,
                    transport: if backend.requires_directory() { "directory" } else { "database" },
                }
                .into());
            }
        };

        info!(
            "Selected '{}' user backend (local store: {})",
            kind,
            if store.is_some() { "yes" } else { "no" }
        );

        Ok(WiredBackend {
            kind,
            service,
            extractor,
            account_loader: store.map(LocalAccountLoader::new),
        })
    }
}
