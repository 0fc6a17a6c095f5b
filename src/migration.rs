//! Catalog schema DDL. Every statement is idempotent so startup can always apply it.

use crate::error::AppError;
use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS "categories" (
        "id" BIGSERIAL PRIMARY KEY,
        "name" VARCHAR(100) NOT NULL UNIQUE,
        "description" TEXT NOT NULL,
        "image" VARCHAR(255),
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS "categories_name_lower_key" ON "categories" (lower("name"))"#,
    r#"
    CREATE TABLE IF NOT EXISTS "products" (
        "id" BIGSERIAL PRIMARY KEY,
        "name" VARCHAR(200) NOT NULL,
        "price" NUMERIC(10, 2) NOT NULL CHECK ("price" >= 0),
        "image" VARCHAR(255),
        "instock" INTEGER NOT NULL DEFAULT 0 CHECK ("instock" >= 0),
        "code" VARCHAR(50) NOT NULL UNIQUE,
        "description" TEXT NOT NULL,
        "category_id" BIGINT NOT NULL REFERENCES "categories" ("id") ON DELETE CASCADE,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS "products_category_id_idx" ON "products" ("category_id")"#,
    r#"CREATE INDEX IF NOT EXISTS "products_created_at_idx" ON "products" ("created_at" DESC, "id" DESC)"#,
];

/// Create the catalog tables and indexes if they do not exist.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    for sql in STATEMENTS {
        tracing::debug!(sql = %sql.trim(), "migration");
        sqlx::query(sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(statements = STATEMENTS.len(), "catalog schema ready");
    Ok(())
}
