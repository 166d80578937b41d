//! Record store collaborator for categories.
//!
//! The engine never owns storage. It reads a full owner snapshot through
//! this trait and hands back validated writes.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::categories::models::{Category, Reparent};

pub use memory::InMemoryCategoryStore;
pub use postgres::PgCategoryStore;

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Every category of one owner, in sibling presentation order
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Category>>;

    async fn find(&self, owner_id: Uuid, category_id: Uuid) -> Result<Option<Category>>;

    /// Owner of a category id regardless of scope, used to refuse
    /// cross-owner parent references
    async fn owner_of(&self, category_id: Uuid) -> Result<Option<Uuid>>;

    async fn insert(&self, category: Category) -> Result<Category>;

    /// Overwrite the mutable fields of an existing category.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` if no row matches `(id, owner_id)`.
    async fn update(&self, category: Category) -> Result<Category>;

    /// Rewrite the given children and delete `category_id` as one unit.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` if the category is already gone; nothing is
    /// written in that case.
    async fn reparent_and_delete(
        &self,
        owner_id: Uuid,
        category_id: Uuid,
        reparented: &[Reparent],
    ) -> Result<()>;
}
