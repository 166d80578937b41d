use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::CategoryStore;
use crate::core::error::{AppError, Result};
use crate::features::categories::hierarchy::sort_siblings;
use crate::features::categories::models::{Category, Reparent};

/// Process-local store, used when no database is configured and in tests
#[derive(Default)]
pub struct InMemoryCategoryStore {
    rows: RwLock<HashMap<Uuid, Category>>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records
    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let rows = categories.into_iter().map(|c| (c.id, c)).collect();
        Self {
            rows: RwLock::new(rows),
        }
    }
}

fn not_found(category_id: Uuid) -> AppError {
    AppError::NotFound(format!("Category '{}' not found", category_id))
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Category>> {
        let rows = self.rows.read().await;
        let mut categories: Vec<Category> = rows
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        sort_siblings(&mut categories);
        Ok(categories)
    }

    async fn find(&self, owner_id: Uuid, category_id: Uuid) -> Result<Option<Category>> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&category_id)
            .filter(|c| c.owner_id == owner_id)
            .cloned())
    }

    async fn owner_of(&self, category_id: Uuid) -> Result<Option<Uuid>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&category_id).map(|c| c.owner_id))
    }

    async fn insert(&self, category: Category) -> Result<Category> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&category.id) {
            return Err(AppError::Internal(format!(
                "Category '{}' already exists",
                category.id
            )));
        }
        rows.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, mut category: Category) -> Result<Category> {
        let mut rows = self.rows.write().await;
        let existing = rows
            .get_mut(&category.id)
            .filter(|c| c.owner_id == category.owner_id)
            .ok_or_else(|| not_found(category.id))?;

        category.created_at = existing.created_at;
        category.updated_at = Utc::now();
        *existing = category.clone();
        Ok(category)
    }

    async fn reparent_and_delete(
        &self,
        owner_id: Uuid,
        category_id: Uuid,
        reparented: &[Reparent],
    ) -> Result<()> {
        let mut rows = self.rows.write().await;
        if !rows
            .get(&category_id)
            .is_some_and(|c| c.owner_id == owner_id)
        {
            return Err(not_found(category_id));
        }

        let now = Utc::now();
        for change in reparented {
            if let Some(child) = rows
                .get_mut(&change.category_id)
                .filter(|c| c.owner_id == owner_id)
            {
                child.parent_id = change.new_parent_id;
                child.display_order = change.display_order;
                child.updated_at = now;
            }
        }

        rows.remove(&category_id);
        Ok(())
    }
}
