//! Startup steps run in a fixed order before the server accepts traffic.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::auth::{PasswordPolicy, TokenService};
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::handlers::AppServices;
use crate::services::{ElasticLogSearch, InMemoryLogSearch, LogSearch, RoleService};
use crate::AppState;

/// Roles every deployment starts with: (name, description)
pub const SEED_ROLES: [(&str, &str); 2] = [("Admin", "Do Anything"), ("User", "View News")];

/// Shared handles being assembled at startup.
pub struct Registry {
    pub db: Arc<DatabaseConnection>,
    pub log_search: Arc<dyn LogSearch>,
    pub tokens: Arc<TokenService>,
}

impl Registry {
    /// Starts with an empty in-memory log store.
    pub fn new(db: Arc<DatabaseConnection>, config: &AppConfig) -> Self {
        Self {
            db,
            log_search: Arc::new(InMemoryLogSearch::default()),
            tokens: Arc::new(TokenService::from_config(config)),
        }
    }

    pub fn into_state(self, config: AppConfig) -> AppState {
        let services = AppServices::new(
            self.db.clone(),
            self.tokens.clone(),
            PasswordPolicy::from(&config.password),
            self.log_search,
        );
        AppState {
            db: self.db,
            config,
            tokens: self.tokens,
            services,
        }
    }
}

#[async_trait]
pub trait Installer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn configure(&self, registry: &mut Registry, config: &AppConfig) -> Result<(), ServiceError>;
}

pub struct DatabaseInstaller;

#[async_trait]
impl Installer for DatabaseInstaller {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn configure(&self, registry: &mut Registry, config: &AppConfig) -> Result<(), ServiceError> {
        if config.auto_migrate {
            crate::db::run_migrations(&registry.db).await?;
        } else {
            info!("Automatic migrations disabled");
        }
        Ok(())
    }
}

pub struct RoleSeedInstaller;

#[async_trait]
impl Installer for RoleSeedInstaller {
    fn name(&self) -> &'static str {
        "role-seed"
    }

    async fn configure(&self, registry: &mut Registry, _config: &AppConfig) -> Result<(), ServiceError> {
        let roles = RoleService::new(registry.db.clone());
        for (name, description) in SEED_ROLES {
            roles.ensure(name, description).await?;
        }
        Ok(())
    }
}

pub struct SearchInstaller;

#[async_trait]
impl Installer for SearchInstaller {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn configure(&self, registry: &mut Registry, config: &AppConfig) -> Result<(), ServiceError> {
        if config.search.enabled {
            info!(url = %config.search.url, index = %config.search.default_index, "Reading logs from search index");
            registry.log_search = Arc::new(ElasticLogSearch::new(&config.search)?);
        } else {
            info!("Search index disabled; log endpoints return no entries");
        }
        Ok(())
    }
}

pub static INSTALLERS: &[&dyn Installer] = &[&DatabaseInstaller, &RoleSeedInstaller, &SearchInstaller];

/// Runs every installer in order, stopping at the first failure.
pub async fn run_all(registry: &mut Registry, config: &AppConfig) -> Result<(), ServiceError> {
    for installer in INSTALLERS {
        installer.configure(registry, config).await?;
        info!(installer = installer.name(), "Installer completed");
    }
    Ok(())
}
