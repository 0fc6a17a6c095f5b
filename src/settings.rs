//! Runtime settings from environment (after `.env` is loaded by the binary).

use crate::error::ConfigError;
use crate::models::{EntityKind, SearchFields};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Which `CatalogStore` backs the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageKind::Postgres),
            "memory" => Ok(StorageKind::Memory),
            other => Err(ConfigError::Invalid {
                key: "CATALOG_STORAGE",
                message: format!("{} (expected postgres or memory)", other),
            }),
        }
    }
}

/// Text shown on the about and contact pages.
#[derive(Clone, Debug)]
pub struct SiteInfo {
    pub name: String,
    pub contact_email: String,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind: SocketAddr,
    pub max_connections: u32,
    pub storage: StorageKind,
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
    pub product_search: SearchFields,
    pub category_search: SearchFields,
    pub site: SiteInfo,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind = get("CATALOG_BIND", "0.0.0.0:3000");
        let bind = bind.parse().map_err(|e| ConfigError::Invalid {
            key: "CATALOG_BIND",
            message: format!("{}: {}", bind, e),
        })?;
        let max_connections = parse_number("CATALOG_MAX_CONNECTIONS", &get("CATALOG_MAX_CONNECTIONS", "5"))?;
        let max_upload_bytes = parse_number("CATALOG_MAX_UPLOAD_BYTES", &get("CATALOG_MAX_UPLOAD_BYTES", "5242880"))?;
        let storage = get("CATALOG_STORAGE", "postgres").parse()?;
        let database_url = match (storage, lookup("DATABASE_URL")) {
            (_, Some(url)) => url,
            (StorageKind::Postgres, None) => return Err(ConfigError::Missing("DATABASE_URL")),
            (StorageKind::Memory, None) => String::new(),
        };

        Ok(Settings {
            database_url,
            bind,
            max_connections,
            storage,
            media_root: PathBuf::from(get("CATALOG_MEDIA_ROOT", "media")),
            max_upload_bytes,
            product_search: SearchFields::parse(
                EntityKind::Product,
                &get("CATALOG_PRODUCT_SEARCH_FIELDS", "name,description,code"),
            )?,
            category_search: SearchFields::parse(
                EntityKind::Category,
                &get("CATALOG_CATEGORY_SEARCH_FIELDS", "name,description"),
            )?,
            site: SiteInfo {
                name: get("CATALOG_SITE_NAME", "Marketplace"),
                contact_email: get("CATALOG_CONTACT_EMAIL", "contact@example.com"),
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: format!("{}: {}", raw, e),
    })
}
