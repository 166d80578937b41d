use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

use super::CategoryStore;
use crate::core::config::DatabaseConfig;
use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, Reparent};

const CATEGORY_COLUMNS: &str = "id, owner_id, parent_id, name, description, icon, color, \
     display_order, is_active, created_at, updated_at";

/// Postgres-backed store
pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool with the configured limits
    pub async fn connect(config: &DatabaseConfig) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("{}: {:?}", context, e);
        AppError::Database(e)
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE owner_id = $1 \
             ORDER BY display_order, name"
        );

        sqlx::query_as::<_, Category>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list categories"))
    }

    async fn find(&self, owner_id: Uuid, category_id: Uuid) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE id = $1 AND owner_id = $2"
        );

        sqlx::query_as::<_, Category>(&sql)
            .bind(category_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get category"))
    }

    async fn owner_of(&self, category_id: Uuid) -> Result<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM categories WHERE id = $1")
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to resolve category owner"))
    }

    async fn insert(&self, category: Category) -> Result<Category> {
        let sql = format!(
            "INSERT INTO categories ({CATEGORY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {CATEGORY_COLUMNS}"
        );

        sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(category.owner_id)
            .bind(category.parent_id)
            .bind(&category.name)
            .bind(&category.description)
            .bind(&category.icon)
            .bind(&category.color)
            .bind(category.display_order)
            .bind(category.is_active)
            .bind(category.created_at)
            .bind(category.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to create category"))
    }

    async fn update(&self, category: Category) -> Result<Category> {
        let sql = format!(
            "UPDATE categories \
             SET parent_id = $3, name = $4, description = $5, icon = $6, color = $7, \
                 display_order = $8, is_active = $9, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING {CATEGORY_COLUMNS}"
        );

        let updated = sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(category.owner_id)
            .bind(category.parent_id)
            .bind(&category.name)
            .bind(&category.description)
            .bind(&category.icon)
            .bind(&category.color)
            .bind(category.display_order)
            .bind(category.is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update category"))?;

        updated.ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", category.id)))
    }

    async fn reparent_and_delete(
        &self,
        owner_id: Uuid,
        category_id: Uuid,
        reparented: &[Reparent],
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin delete transaction"))?;

        for change in reparented {
            sqlx::query(
                "UPDATE categories \
                 SET parent_id = $1, display_order = $2, updated_at = NOW() \
                 WHERE id = $3 AND owner_id = $4",
            )
            .bind(change.new_parent_id)
            .bind(change.display_order)
            .bind(change.category_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to reparent category"))?;
        }

        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1 AND owner_id = $2")
            .bind(category_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete category"))?;

        if deleted.rows_affected() == 0 {
            // Dropping the transaction rolls back the reparenting above
            return Err(AppError::NotFound(format!(
                "Category '{}' not found",
                category_id
            )));
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit delete transaction"))?;

        Ok(())
    }
}
