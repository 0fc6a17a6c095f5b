//! Storage for categories and products behind one trait, plus PostgreSQL bootstrap.

mod memory;
mod postgres;

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;

use crate::error::AppError;
use crate::models::{Category, CategoryInput, CategorySummary, Product, ProductFilter, ProductInput, Search};
use crate::pagination::PageWindow;
use async_trait::async_trait;
use sqlx::ConnectOptions;
use std::str::FromStr;

/// Persistence for the catalog. Implementations enforce the same constraints as the
/// relational schema: unique product code, unique category name (case-insensitive),
/// products reference an existing category, and category deletion cascades.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Liveness probe for the readiness endpoint.
    async fn ping(&self) -> Result<(), AppError>;

    async fn count_categories(&self, search: Option<Search<'_>>) -> Result<u64, AppError>;
    async fn list_categories(&self, search: Option<Search<'_>>, window: PageWindow) -> Result<Vec<CategorySummary>, AppError>;
    /// Every category in default order, for choice lists.
    async fn all_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError>;
    async fn category_name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;
    async fn insert_category(&self, input: &CategoryInput) -> Result<Category, AppError>;
    async fn update_category(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>, AppError>;
    /// Removes the category and all of its products.
    async fn delete_category(&self, id: i64) -> Result<Option<Category>, AppError>;

    async fn count_products(&self, filter: ProductFilter<'_>) -> Result<u64, AppError>;
    async fn list_products(&self, filter: ProductFilter<'_>, window: PageWindow) -> Result<Vec<Product>, AppError>;
    async fn get_product(&self, id: i64) -> Result<Option<Product>, AppError>;
    async fn product_code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;
    async fn insert_product(&self, input: &ProductInput) -> Result<Product, AppError>;
    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Option<Product>, AppError>;
    async fn delete_product(&self, id: i64) -> Result<Option<Product>, AppError>;
}

/// Connect to the `postgres` database on the same server and create the target database if missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url.rfind('/').ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
