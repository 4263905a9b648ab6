pub mod admin;
pub mod authz;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod models;
pub mod service;

// Re-export commonly used items for tests
pub use admin::{MenuAdmin, RoleAdmin};
pub use cache::DepartmentMenuCache;
pub use config::GuardConfig;
pub use db::SqliteCatalog;
pub use errors::{AppError, AppResult};
pub use service::GuardService;
