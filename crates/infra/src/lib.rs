//! Infrastructure layer: storage adapters, schema bootstrap, configuration.

pub mod config;
pub mod db;
pub mod store;

pub use config::{CatalogConfig, ConfigError, DatabaseConfig};
pub use store::{InMemoryProductStore, PostgresProductStore};
