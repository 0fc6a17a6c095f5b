//! Catalog: product and category browsing, search, and CRUD over HTTP with PostgreSQL.

pub mod error;
pub mod extractors;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod migration;
pub mod models;
pub mod pagination;
pub mod response;
pub mod routes;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, ConfigError, FormErrors};
pub use migration::apply_migrations;
pub use routes::app;
pub use settings::{Settings, StorageKind};
pub use state::AppState;
pub use store::{ensure_database_exists, CatalogStore, MemoryCatalogStore, PgCatalogStore};
