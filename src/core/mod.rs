pub mod config;
pub mod database_manager;
pub mod paths;
pub mod types;

pub use config::Config;
pub use database_manager::DatabaseManager;
