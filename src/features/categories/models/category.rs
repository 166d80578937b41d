use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for category
///
/// The flat, parent-referencing record is the source of truth for the
/// hierarchy. Trees are always rebuilt from a snapshot of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category together with its ordered children and depth.
///
/// Derived view only; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: Category,
    pub level: usize,
    pub children: Vec<CategoryTree>,
}

impl CategoryTree {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            level: 0,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.category.id
    }
}

/// Input for creating a category
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub icon: Option<String>,
    pub color: Option<String>,
    /// Appended after existing siblings when absent
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Partial update for a category.
///
/// Nullable fields use `Option<Option<_>>`: `None` leaves the field alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub parent_id: Option<Option<Uuid>>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.parent_id.is_none()
            && self.icon.is_none()
            && self.color.is_none()
            && self.display_order.is_none()
            && self.is_active.is_none()
    }

    /// Apply the supplied fields onto `category`.
    pub fn apply_to(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(description) = self.description {
            category.description = description;
        }
        if let Some(parent_id) = self.parent_id {
            category.parent_id = parent_id;
        }
        if let Some(icon) = self.icon {
            category.icon = icon;
        }
        if let Some(color) = self.color {
            category.color = color;
        }
        if let Some(display_order) = self.display_order {
            category.display_order = display_order;
        }
        if let Some(is_active) = self.is_active {
            category.is_active = is_active;
        }
    }
}

/// One child rewrite performed as part of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reparent {
    pub category_id: Uuid,
    pub new_parent_id: Option<Uuid>,
    pub display_order: i32,
}

/// Listing options shared by the flat and tree reads
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Drop inactive categories before building anything
    pub active_only: bool,
    /// Case-insensitive match on name and description
    pub search: Option<String>,
}

/// Rendered path of a category together with the ancestors it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPath {
    pub category_id: Uuid,
    pub path: String,
    pub ancestors: Vec<Category>,
}

/// What a delete did to the hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub category_id: Uuid,
    pub promoted_to: Option<Uuid>,
    pub reparented: Vec<Reparent>,
}

/// Outcome of checking a proposed `parent_id` change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MoveValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::category;

    #[test]
    fn test_changes_apply_and_clear() {
        let owner = Uuid::new_v4();
        let mut c = category(owner, "Drinks", None, 0);
        c.description = Some("cold".to_string());

        let changes = CategoryChanges {
            name: Some("Beverages".to_string()),
            description: Some(None),
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        changes.apply_to(&mut c);

        assert_eq!(c.name, "Beverages");
        assert_eq!(c.description, None);
        assert!(!c.is_active);
        assert_eq!(c.parent_id, None);
    }

    #[test]
    fn test_empty_changes() {
        assert!(CategoryChanges::default().is_empty());
    }
}
