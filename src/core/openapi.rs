use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::shared::constants::OWNER_ID_HEADER;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories
        categories_handlers::list_categories,
        categories_handlers::create_category,
        categories_handlers::get_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        categories_handlers::move_category,
        categories_handlers::validate_move,
        categories_handlers::get_category_path,
        categories_handlers::list_children,
        categories_handlers::list_descendants,
        categories_handlers::list_descendant_ids,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Categories
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryTreeDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::MoveCategoryDto,
            categories_dtos::ValidateMoveDto,
            categories_dtos::MoveValidationDto,
            categories_dtos::CategoryPathDto,
            categories_dtos::DescendantIdsDto,
            categories_dtos::ReparentedCategoryDto,
            categories_dtos::DeleteCategoryResponseDto,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<Vec<categories_dtos::CategoryTreeDto>>,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<categories_dtos::MoveValidationDto>,
            ApiResponse<categories_dtos::CategoryPathDto>,
            ApiResponse<categories_dtos::DescendantIdsDto>,
            ApiResponse<categories_dtos::DeleteCategoryResponseDto>,
        )
    ),
    tags(
        (name = "categories", description = "Owner-scoped category hierarchy"),
    ),
    modifiers(&OwnerHeaderAddon),
    security(
        ("owner_id" = [])
    ),
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "API documentation for the catalog category service",
    )
)]
pub struct ApiDoc;

/// Documents the `X-Owner-Id` header every category endpoint requires
struct OwnerHeaderAddon;

impl Modify for OwnerHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "owner_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(OWNER_ID_HEADER))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_category_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/categories"));
        assert!(doc.paths.paths.contains_key("/api/categories/{id}/move/validate"));

        let schemes = doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("owner_id"));
    }
}
