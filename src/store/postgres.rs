//! `CatalogStore` over a PostgreSQL pool.

use crate::error::AppError;
use crate::models::{Category, CategoryInput, CategorySummary, Product, ProductFilter, ProductInput, Search};
use crate::pagination::PageWindow;
use crate::sql::{
    bind_query_as, bind_scalar, count, delete, exists_matching, insert, select_all, select_by_id, select_list, update, Assignment,
    ListFilter, QueryBuf, TableSpec, CATEGORIES, PRODUCTS,
};
use crate::store::CatalogStore;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        PgCatalogStore { pool }
    }

    async fn fetch_many<T>(&self, q: &QueryBuf) -> Result<Vec<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_query_as(sqlx::query_as::<_, T>(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_optional<T>(&self, q: &QueryBuf) -> Result<Option<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_query_as(sqlx::query_as::<_, T>(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn fetch_by_id<T>(&self, spec: &TableSpec, id: i64) -> Result<Option<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = select_by_id(spec);
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn delete_by_id<T>(&self, spec: &TableSpec, id: i64) -> Result<Option<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = delete(spec);
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn count(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let n: i64 = bind_scalar(sqlx::query_scalar::<_, i64>(&q.sql), &q.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }

    async fn exists(&self, q: &QueryBuf) -> Result<bool, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let found: bool = bind_scalar(sqlx::query_scalar::<_, bool>(&q.sql), &q.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }
}

fn category_values(input: &CategoryInput) -> Vec<Assignment> {
    vec![
        Assignment::set("name", input.name.clone()),
        Assignment::set("description", input.description.clone()),
        Assignment::set_if_present("image", input.image.clone()),
    ]
}

fn product_values(input: &ProductInput) -> Vec<Assignment> {
    vec![
        Assignment::set("name", input.name.clone()),
        Assignment::set("price", input.price),
        Assignment::set("instock", input.instock),
        Assignment::set("code", input.code.clone()),
        Assignment::set("description", input.description.clone()),
        Assignment::set("category_id", input.category_id),
        Assignment::set_if_present("image", input.image.clone()),
    ]
}

fn product_list_filter(filter: ProductFilter<'_>) -> ListFilter<'_> {
    ListFilter {
        search: filter.search,
        parent: filter.category_id.map(|id| ("category_id", id)),
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn count_categories(&self, search: Option<Search<'_>>) -> Result<u64, AppError> {
        let filter = ListFilter { search, parent: None };
        self.count(&count(&CATEGORIES, &filter)).await
    }

    async fn list_categories(&self, search: Option<Search<'_>>, window: PageWindow) -> Result<Vec<CategorySummary>, AppError> {
        let filter = ListFilter { search, parent: None };
        self.fetch_many(&select_list(&CATEGORIES, &filter, window)).await
    }

    async fn all_categories(&self) -> Result<Vec<Category>, AppError> {
        let sql = select_all(&CATEGORIES);
        tracing::debug!(sql = %sql, "query");
        Ok(sqlx::query_as::<_, Category>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        self.fetch_by_id(&CATEGORIES, id).await
    }

    async fn category_name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        self.exists(&exists_matching(&CATEGORIES, "name", name, true, exclude_id)).await
    }

    async fn insert_category(&self, input: &CategoryInput) -> Result<Category, AppError> {
        let q = insert(&CATEGORIES, category_values(input));
        self.fetch_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update_category(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>, AppError> {
        self.fetch_optional(&update(&CATEGORIES, id, category_values(input))).await
    }

    async fn delete_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        // products go with it through ON DELETE CASCADE
        self.delete_by_id(&CATEGORIES, id).await
    }

    async fn count_products(&self, filter: ProductFilter<'_>) -> Result<u64, AppError> {
        self.count(&count(&PRODUCTS, &product_list_filter(filter))).await
    }

    async fn list_products(&self, filter: ProductFilter<'_>, window: PageWindow) -> Result<Vec<Product>, AppError> {
        self.fetch_many(&select_list(&PRODUCTS, &product_list_filter(filter), window)).await
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        self.fetch_by_id(&PRODUCTS, id).await
    }

    async fn product_code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        self.exists(&exists_matching(&PRODUCTS, "code", code, false, exclude_id)).await
    }

    async fn insert_product(&self, input: &ProductInput) -> Result<Product, AppError> {
        let q = insert(&PRODUCTS, product_values(input));
        self.fetch_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Option<Product>, AppError> {
        self.fetch_optional(&update(&PRODUCTS, id, product_values(input))).await
    }

    async fn delete_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        self.delete_by_id(&PRODUCTS, id).await
    }
}
