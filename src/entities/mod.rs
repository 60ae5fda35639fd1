// Content
pub mod category;
pub mod category_news;
pub mod news;

// Navigation
pub mod menu;
pub mod menu_role;

// Identity
pub mod account;
pub mod account_role;
pub mod role;
pub mod role_claim;
