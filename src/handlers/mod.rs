pub mod accounts;
pub mod categories;
pub mod common;
pub mod logs;
pub mod menus;
pub mod news;
pub mod roles;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::{PasswordPolicy, TokenService};
use crate::services::{
    AccountService, CategoryService, LogSearch, LogService, MenuService, NewsService, RoleService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by the HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<CategoryService>,
    pub menus: Arc<MenuService>,
    pub news: Arc<NewsService>,
    pub roles: Arc<RoleService>,
    pub accounts: Arc<AccountService>,
    pub logs: Arc<LogService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        tokens: Arc<TokenService>,
        policy: PasswordPolicy,
        log_search: Arc<dyn LogSearch>,
    ) -> Self {
        Self {
            categories: Arc::new(CategoryService::new(db.clone())),
            menus: Arc::new(MenuService::new(db.clone())),
            news: Arc::new(NewsService::new(db.clone())),
            roles: Arc::new(RoleService::new(db.clone())),
            accounts: Arc::new(AccountService::new(db, tokens, policy)),
            logs: Arc::new(LogService::new(log_search)),
        }
    }
}
