use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, OwnerContext};
use crate::features::categories::dtos::{
    CategoryPathDto, CategoryResponseDto, CategoryTreeDto, CreateCategoryDto,
    DeleteCategoryResponseDto, DescendantIdsDto, ListCategoriesQuery, MoveCategoryDto,
    MoveValidationDto, UpdateCategoryDto, ValidateMoveDto,
};
use crate::features::categories::models::{Category, CategoryFilter};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ApiResponse, Meta};

fn to_dtos(categories: Vec<Category>) -> Vec<CategoryResponseDto> {
    categories.into_iter().map(Into::into).collect()
}

/// List categories of the calling owner
///
/// Returns categories as flat list or tree structure based on `tree` query param.
#[utoipa::path(
    get,
    path = "/api/categories",
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "Flat list, or tree when `tree=true`", body = ApiResponse<Vec<CategoryResponseDto>>),
        (status = 401, description = "Missing owner identity")
    ),
    tag = "categories"
)]
pub async fn list_categories(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let filter = CategoryFilter::from(&query);

    let (value, total) = if query.tree {
        let tree: Vec<CategoryTreeDto> = service
            .tree(owner.owner_id, &filter)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let total = tree.len();
        (serde_json::to_value(tree), total)
    } else {
        let categories = to_dtos(service.list(owner.owner_id, &filter).await?);
        let total = categories.len();
        (serde_json::to_value(categories), total)
    };

    let value = value.map_err(|e| AppError::Internal(format!("Failed to serialize: {}", e)))?;
    Ok(Json(ApiResponse::success(
        Some(value),
        None,
        Some(Meta::total(total)),
    )))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "categories"
)]
pub async fn create_category(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.create(owner.owner_id, dto.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category.into()),
            Some("Category created".to_string()),
            None,
        )),
    ))
}

/// Get a category by id
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get(owner.owner_id, id).await?;
    Ok(Json(ApiResponse::success(Some(category.into()), None, None)))
}

/// Update a category
///
/// A `parent_id` in the body is checked like a move; if it is rejected no
/// field is changed.
#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error or invalid parent"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn update_category(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.update(owner.owner_id, id, dto.into()).await?;
    Ok(Json(ApiResponse::success(
        Some(category.into()),
        Some("Category updated".to_string()),
        None,
    )))
}

/// Delete a category, moving its children up to its parent
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<DeleteCategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn delete_category(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteCategoryResponseDto>>> {
    let outcome = service.delete(owner.owner_id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(outcome.into()),
        Some("Category deleted".to_string()),
        None,
    )))
}

/// Move a category under a new parent and/or to a new position
#[utoipa::path(
    post,
    path = "/api/categories/{id}/move",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    request_body = MoveCategoryDto,
    responses(
        (status = 200, description = "Category moved", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Move would create a cycle"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn move_category(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<MoveCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service
        .move_to(owner.owner_id, id, dto.new_parent_id, dto.new_display_order)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(category.into()),
        Some("Category moved".to_string()),
        None,
    )))
}

/// Check whether a move would be accepted, without applying it
#[utoipa::path(
    post,
    path = "/api/categories/{id}/move/validate",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    request_body = ValidateMoveDto,
    responses(
        (status = 200, description = "Validation result", body = ApiResponse<MoveValidationDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn validate_move(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ValidateMoveDto>,
) -> Result<Json<ApiResponse<MoveValidationDto>>> {
    let validation = service
        .check_move(owner.owner_id, id, dto.new_parent_id)
        .await?;
    Ok(Json(ApiResponse::success(Some(validation.into()), None, None)))
}

/// Get the full path of a category
#[utoipa::path(
    get,
    path = "/api/categories/{id}/path",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Path and ancestors", body = ApiResponse<CategoryPathDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category_path(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryPathDto>>> {
    let path = service.path(owner.owner_id, id).await?;
    Ok(Json(ApiResponse::success(Some(path.into()), None, None)))
}

/// List direct children of a category
#[utoipa::path(
    get,
    path = "/api/categories/{id}/children",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Direct children", body = ApiResponse<Vec<CategoryResponseDto>>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn list_children(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let children = to_dtos(service.children(owner.owner_id, id).await?);
    let total = children.len();
    Ok(Json(ApiResponse::success(
        Some(children),
        None,
        Some(Meta::total(total)),
    )))
}

/// List all descendants of a category
#[utoipa::path(
    get,
    path = "/api/categories/{id}/descendants",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "All descendants", body = ApiResponse<Vec<CategoryResponseDto>>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn list_descendants(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let descendants = to_dtos(service.descendants(owner.owner_id, id).await?);
    let total = descendants.len();
    Ok(Json(ApiResponse::success(
        Some(descendants),
        None,
        Some(Meta::total(total)),
    )))
}

/// Ids of a category and everything below it
#[utoipa::path(
    get,
    path = "/api/categories/{id}/descendant-ids",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Membership ids", body = ApiResponse<DescendantIdsDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn list_descendant_ids(
    owner: OwnerContext,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DescendantIdsDto>>> {
    let ids = service.descendant_ids(owner.owner_id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(DescendantIdsDto { id, ids }),
        None,
        None,
    )))
}
