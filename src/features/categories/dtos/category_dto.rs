use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::categories::models::{
    Category, CategoryChanges, CategoryFilter, CategoryPath, CategoryTree, DeleteOutcome,
    MoveValidation, NewCategory, Reparent,
};
use crate::shared::validation::HEX_COLOR_REGEX;

/// Distinguish an absent field from an explicit `null`
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Treat blank strings from forms as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Query params for listing categories
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCategoriesQuery {
    /// If true, return tree structure. Default: false (flat list)
    #[serde(default)]
    pub tree: bool,
    /// If true, hide inactive categories
    #[serde(default)]
    pub active_only: bool,
    /// Case-insensitive match on name or description
    pub search: Option<String>,
}

impl From<&ListCategoriesQuery> for CategoryFilter {
    fn from(query: &ListCategoriesQuery) -> Self {
        Self {
            active_only: query.active_only,
            search: non_blank(query.search.clone()),
        }
    }
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
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

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name,
            description: c.description,
            icon: c.icon,
            color: c.color,
            display_order: c.display_order,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Response DTO for category tree (hierarchical structure)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    /// Depth from the root, roots are 0
    pub level: usize,
    pub children: Vec<CategoryTreeDto>,
}

impl From<CategoryTree> for CategoryTreeDto {
    fn from(node: CategoryTree) -> Self {
        let c = node.category;
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name,
            description: c.description,
            icon: c.icon,
            color: c.color,
            display_order: c.display_order,
            is_active: c.is_active,
            level: node.level,
            children: node.children.into_iter().map(Into::into).collect(),
        }
    }
}

/// Request DTO for creating a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must not exceed 2000 characters"))]
    pub description: Option<String>,

    /// Parent category; omit or null for a root category
    pub parent_id: Option<Uuid>,

    #[validate(length(max = 64, message = "Icon must not exceed 64 characters"))]
    pub icon: Option<String>,

    #[validate(regex(path = *HEX_COLOR_REGEX, message = "Color must be a hex color like #1a2b3c"))]
    pub color: Option<String>,

    /// Appended after existing siblings when omitted
    pub display_order: Option<i32>,

    /// Defaults to true
    pub is_active: Option<bool>,
}

impl From<CreateCategoryDto> for NewCategory {
    fn from(dto: CreateCategoryDto) -> Self {
        Self {
            name: dto.name,
            description: non_blank(dto.description),
            parent_id: dto.parent_id,
            icon: non_blank(dto.icon),
            color: non_blank(dto.color),
            display_order: dto.display_order,
            is_active: dto.is_active,
        }
    }
}

/// Request DTO for updating a category
///
/// Omitted fields are left untouched; `null` clears nullable fields.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 2000, message = "Description must not exceed 2000 characters"))]
    pub description: Option<Option<String>>,

    /// Setting this is validated like a move
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub parent_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 64, message = "Icon must not exceed 64 characters"))]
    pub icon: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(regex(path = *HEX_COLOR_REGEX, message = "Color must be a hex color like #1a2b3c"))]
    pub color: Option<Option<String>>,

    pub display_order: Option<i32>,

    pub is_active: Option<bool>,
}

impl From<UpdateCategoryDto> for CategoryChanges {
    fn from(dto: UpdateCategoryDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description.map(non_blank),
            parent_id: dto.parent_id,
            icon: dto.icon.map(non_blank),
            color: dto.color.map(non_blank),
            display_order: dto.display_order,
            is_active: dto.is_active,
        }
    }
}

/// Request DTO for moving a category
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MoveCategoryDto {
    /// New parent; null moves the category to the root level
    pub new_parent_id: Option<Uuid>,
    /// Position among the new siblings; appended last when omitted
    pub new_display_order: Option<i32>,
}

/// Request DTO for checking a move without applying it
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ValidateMoveDto {
    pub new_parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MoveValidationDto {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<MoveValidation> for MoveValidationDto {
    fn from(v: MoveValidation) -> Self {
        Self {
            valid: v.valid,
            error: v.error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryPathDto {
    pub id: Uuid,
    /// Names from the root down, e.g. "Food > Drinks > Tea"
    pub path: String,
    /// Root first, immediate parent last
    pub ancestors: Vec<CategoryResponseDto>,
}

impl From<CategoryPath> for CategoryPathDto {
    fn from(p: CategoryPath) -> Self {
        Self {
            id: p.category_id,
            path: p.path,
            ancestors: p.ancestors.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DescendantIdsDto {
    pub id: Uuid,
    /// The category itself followed by all descendants
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReparentedCategoryDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
}

impl From<Reparent> for ReparentedCategoryDto {
    fn from(r: Reparent) -> Self {
        Self {
            id: r.category_id,
            parent_id: r.new_parent_id,
            display_order: r.display_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteCategoryResponseDto {
    pub id: Uuid,
    /// Parent the direct children were moved to; null means root
    pub promoted_to: Option<Uuid>,
    pub reparented: Vec<ReparentedCategoryDto>,
}

impl From<DeleteOutcome> for DeleteCategoryResponseDto {
    fn from(o: DeleteOutcome) -> Self {
        Self {
            id: o.category_id,
            promoted_to: o.promoted_to,
            reparented: o.reparented.into_iter().map(Into::into).collect(),
        }
    }
}
