use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::hierarchy;
use crate::features::categories::models::{
    Category, CategoryChanges, CategoryFilter, CategoryPath, CategoryTree, DeleteOutcome,
    MoveValidation, NewCategory, Reparent,
};
use crate::features::categories::store::CategoryStore;

/// Service for category operations
///
/// Reads go through a full owner snapshot and the pure functions in
/// `hierarchy`. Every write is validated against that snapshot before the
/// store is touched, so a rejected request never leaves a partial write.
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
}

fn not_found(category_id: Uuid) -> AppError {
    AppError::NotFound(format!("Category '{}' not found", category_id))
}

fn find_in(snapshot: &[Category], category_id: Uuid) -> Result<&Category> {
    snapshot
        .iter()
        .find(|c| c.id == category_id)
        .ok_or_else(|| not_found(category_id))
}

fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Category name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn into_result(validation: MoveValidation, category_id: Uuid) -> Result<()> {
    if validation.valid {
        return Ok(());
    }
    let reason = validation
        .error
        .unwrap_or_else(|| "Invalid category move".to_string());
    tracing::warn!(category_id = %category_id, "Rejected category move: {}", reason);
    Err(AppError::Validation(reason))
}

fn order_exhausted(parent_id: Option<Uuid>) -> AppError {
    tracing::warn!(parent_id = ?parent_id, "Sibling display_order is already at i32::MAX");
    AppError::Validation(
        "No display_order left after the last sibling; give an explicit order or reorder the siblings"
            .to_string(),
    )
}

/// Order that appends after the current children of `parent_id`
fn append_order(
    parent_id: Option<Uuid>,
    snapshot: &[Category],
    excluding: Option<Uuid>,
) -> Result<i32> {
    hierarchy::next_display_order(parent_id, snapshot, excluding)
        .ok_or_else(|| order_exhausted(parent_id))
}

impl CategoryService {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self { store }
    }

    async fn snapshot(&self, owner_id: Uuid) -> Result<Vec<Category>> {
        self.store.list_by_owner(owner_id).await
    }

    /// Refuse a parent that lives in another owner's hierarchy.
    ///
    /// A parent that resolves nowhere is accepted and the category shows up
    /// as a root.
    async fn ensure_parent_in_scope(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        snapshot: &[Category],
    ) -> Result<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        if snapshot.iter().any(|c| c.id == parent_id) {
            return Ok(());
        }

        match self.store.owner_of(parent_id).await? {
            Some(other) if other != owner_id => {
                tracing::warn!(
                    owner_id = %owner_id,
                    parent_id = %parent_id,
                    "Rejected cross-owner parent reference"
                );
                Err(AppError::Validation(
                    "Parent category belongs to another owner".to_string(),
                ))
            }
            _ => {
                tracing::debug!(
                    parent_id = %parent_id,
                    "Parent does not resolve, category will be presented as a root"
                );
                Ok(())
            }
        }
    }

    /// List categories (flat), in sibling presentation order
    pub async fn list(&self, owner_id: Uuid, filter: &CategoryFilter) -> Result<Vec<Category>> {
        let mut categories = self.snapshot(owner_id).await?;
        if filter.active_only {
            categories.retain(|c| c.is_active);
        }

        if let Some(term) = filter.search.as_deref() {
            let needle = term.trim().to_lowercase();
            if !needle.is_empty() {
                categories.retain(|c| {
                    c.name.to_lowercase().contains(&needle)
                        || c.description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(&needle))
                });
            }
        }

        hierarchy::sort_siblings(&mut categories);
        Ok(categories)
    }

    /// List categories as tree structure
    pub async fn tree(&self, owner_id: Uuid, filter: &CategoryFilter) -> Result<Vec<CategoryTree>> {
        let mut categories = self.snapshot(owner_id).await?;
        if filter.active_only {
            categories.retain(|c| c.is_active);
        }

        let tree = hierarchy::build_tree(&categories);
        Ok(match filter.search.as_deref() {
            Some(term) => hierarchy::filter_tree(&tree, term),
            None => tree,
        })
    }

    pub async fn get(&self, owner_id: Uuid, category_id: Uuid) -> Result<Category> {
        self.store
            .find(owner_id, category_id)
            .await?
            .ok_or_else(|| not_found(category_id))
    }

    pub async fn path(&self, owner_id: Uuid, category_id: Uuid) -> Result<CategoryPath> {
        let snapshot = self.snapshot(owner_id).await?;
        let category = find_in(&snapshot, category_id)?;

        Ok(CategoryPath {
            category_id,
            path: hierarchy::category_path(category, &snapshot),
            ancestors: hierarchy::ancestors(category_id, &snapshot),
        })
    }

    pub async fn children(&self, owner_id: Uuid, category_id: Uuid) -> Result<Vec<Category>> {
        let snapshot = self.snapshot(owner_id).await?;
        find_in(&snapshot, category_id)?;
        Ok(hierarchy::children(category_id, &snapshot))
    }

    pub async fn descendants(&self, owner_id: Uuid, category_id: Uuid) -> Result<Vec<Category>> {
        let snapshot = self.snapshot(owner_id).await?;
        find_in(&snapshot, category_id)?;
        Ok(hierarchy::descendants(category_id, &snapshot))
    }

    /// The category id plus all of its descendant ids
    pub async fn descendant_ids(&self, owner_id: Uuid, category_id: Uuid) -> Result<Vec<Uuid>> {
        let snapshot = self.snapshot(owner_id).await?;
        find_in(&snapshot, category_id)?;
        Ok(hierarchy::ids_including_descendants(category_id, &snapshot))
    }

    /// Dry-run a reparenting without writing anything
    pub async fn check_move(
        &self,
        owner_id: Uuid,
        category_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> Result<MoveValidation> {
        let snapshot = self.snapshot(owner_id).await?;
        find_in(&snapshot, category_id)?;
        Ok(hierarchy::validate_move(
            category_id,
            new_parent_id,
            &snapshot,
        ))
    }

    /// Create a category, appending it after its siblings unless an order is given
    pub async fn create(&self, owner_id: Uuid, data: NewCategory) -> Result<Category> {
        let name = normalize_name(&data.name)?;
        let snapshot = self.snapshot(owner_id).await?;
        let id = Uuid::now_v7();

        into_result(
            hierarchy::validate_move(id, data.parent_id, &snapshot),
            id,
        )?;
        self.ensure_parent_in_scope(owner_id, data.parent_id, &snapshot)
            .await?;

        let display_order = match data.display_order {
            Some(order) => order,
            None => append_order(data.parent_id, &snapshot, None)?,
        };

        let now = Utc::now();
        let category = Category {
            id,
            owner_id,
            parent_id: data.parent_id,
            name,
            description: data.description,
            icon: data.icon,
            color: data.color,
            display_order,
            is_active: data.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert(category).await?;
        tracing::info!(
            category_id = %created.id,
            owner_id = %owner_id,
            parent_id = ?created.parent_id,
            display_order = created.display_order,
            "Category created"
        );

        Ok(created)
    }

    /// Update fields of a category.
    ///
    /// A `parent_id` change is validated first; on rejection none of the
    /// other fields are applied either.
    pub async fn update(
        &self,
        owner_id: Uuid,
        category_id: Uuid,
        mut changes: CategoryChanges,
    ) -> Result<Category> {
        let snapshot = self.snapshot(owner_id).await?;
        let mut category = find_in(&snapshot, category_id)?.clone();

        if let Some(name) = changes.name.take() {
            changes.name = Some(normalize_name(&name)?);
        }

        if let Some(new_parent_id) = changes.parent_id {
            into_result(
                hierarchy::validate_move(category_id, new_parent_id, &snapshot),
                category_id,
            )?;
            self.ensure_parent_in_scope(owner_id, new_parent_id, &snapshot)
                .await?;
        }

        if changes.is_empty() {
            return Ok(category);
        }

        changes.apply_to(&mut category);
        let updated = self.store.update(category).await?;
        tracing::info!(category_id = %category_id, owner_id = %owner_id, "Category updated");

        Ok(updated)
    }

    /// Move a category under a new parent (or to root) and reposition it.
    ///
    /// Both fields land in one write. Without an explicit order the category
    /// is appended after its new siblings.
    pub async fn move_to(
        &self,
        owner_id: Uuid,
        category_id: Uuid,
        new_parent_id: Option<Uuid>,
        new_display_order: Option<i32>,
    ) -> Result<Category> {
        let snapshot = self.snapshot(owner_id).await?;
        let mut category = find_in(&snapshot, category_id)?.clone();

        into_result(
            hierarchy::validate_move(category_id, new_parent_id, &snapshot),
            category_id,
        )?;
        self.ensure_parent_in_scope(owner_id, new_parent_id, &snapshot)
            .await?;

        category.display_order = match new_display_order {
            Some(order) => order,
            None => append_order(new_parent_id, &snapshot, Some(category_id))?,
        };
        category.parent_id = new_parent_id;

        let moved = self.store.update(category).await?;
        tracing::info!(
            category_id = %category_id,
            owner_id = %owner_id,
            parent_id = ?moved.parent_id,
            display_order = moved.display_order,
            "Category moved"
        );

        Ok(moved)
    }

    /// Delete a category without deleting its subtree.
    ///
    /// The direct children are spliced up to the deleted category's parent
    /// (or to root), appended after that parent's remaining children in
    /// their current order. Deeper descendants keep their parents.
    ///
    /// A child that is itself the promotion target only exists on a parent
    /// cycle; it goes to root instead of becoming its own parent.
    pub async fn delete(&self, owner_id: Uuid, category_id: Uuid) -> Result<DeleteOutcome> {
        let category = self.get(owner_id, category_id).await?;
        let promotion_target = category.parent_id;

        let snapshot = self.snapshot(owner_id).await?;
        let subtree_size = hierarchy::descendants(category_id, &snapshot).len();

        let children = hierarchy::children(category_id, &snapshot);
        let mut next_orders: HashMap<Option<Uuid>, Option<i32>> = HashMap::new();
        let mut reparented: Vec<Reparent> = Vec::with_capacity(children.len());

        for child in children {
            let new_parent_id = promotion_target.filter(|&target| target != child.id);
            let display_order = match next_orders.get(&new_parent_id) {
                Some(next) => *next,
                None => hierarchy::next_display_order(new_parent_id, &snapshot, Some(category_id)),
            }
            .ok_or_else(|| order_exhausted(new_parent_id))?;

            next_orders.insert(new_parent_id, display_order.checked_add(1));
            reparented.push(Reparent {
                category_id: child.id,
                new_parent_id,
                display_order,
            });
        }

        self.store
            .reparent_and_delete(owner_id, category_id, &reparented)
            .await?;

        tracing::info!(
            category_id = %category_id,
            owner_id = %owner_id,
            promoted_to = ?promotion_target,
            reparented = reparented.len(),
            subtree_size,
            "Category deleted"
        );

        Ok(DeleteOutcome {
            category_id,
            promoted_to: promotion_target,
            reparented,
        })
    }
}
