// Shared building blocks
pub mod association;
pub mod filter;
pub mod tree;

// Content
pub mod category;
pub mod news;

// Navigation
pub mod menu;

// Identity
pub mod account;
pub mod role;

// Search index
pub mod log;

pub use account::AccountService;
pub use category::CategoryService;
pub use log::{ElasticLogSearch, InMemoryLogSearch, LogSearch, LogService};
pub use menu::MenuService;
pub use news::NewsService;
pub use role::RoleService;
