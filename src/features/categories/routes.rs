use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Create routes for the categories feature
///
/// Handlers read the caller from `OwnerContext`, so the router must be
/// mounted behind `owner_scope_middleware`.
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/categories/{id}",
            get(handlers::get_category)
                .patch(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route("/api/categories/{id}/move", post(handlers::move_category))
        .route(
            "/api/categories/{id}/move/validate",
            post(handlers::validate_move),
        )
        .route("/api/categories/{id}/path", get(handlers::get_category_path))
        .route("/api/categories/{id}/children", get(handlers::list_children))
        .route(
            "/api/categories/{id}/descendants",
            get(handlers::list_descendants),
        )
        .route(
            "/api/categories/{id}/descendant-ids",
            get(handlers::list_descendant_ids),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::core::middleware::owner_scope_middleware;
    use crate::features::categories::store::InMemoryCategoryStore;
    use crate::shared::constants::OWNER_ID_HEADER;
    use crate::shared::test_helpers::{category, with_owner};

    fn service(store: InMemoryCategoryStore) -> Arc<CategoryService> {
        Arc::new(CategoryService::new(Arc::new(store)))
    }

    fn server_for(owner: Uuid, store: InMemoryCategoryStore) -> TestServer {
        TestServer::new(with_owner(routes(service(store)), owner)).unwrap()
    }

    fn id_of(body: &Value) -> Uuid {
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_owner_header_is_required() {
        let app = routes(service(InMemoryCategoryStore::new()))
            .route_layer(axum::middleware::from_fn(owner_scope_middleware));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/categories").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/categories")
            .add_header(
                HeaderName::from_static(OWNER_ID_HEADER),
                HeaderValue::from_static("not-a-uuid"),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let owner = Uuid::new_v4().to_string();
        let response = server
            .get("/api/categories")
            .add_header(
                HeaderName::from_static(OWNER_ID_HEADER),
                HeaderValue::from_str(&owner).unwrap(),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_and_read_tree() {
        let owner = Uuid::new_v4();
        let server = server_for(owner, InMemoryCategoryStore::new());

        let response = server
            .post("/api/categories")
            .json(&json!({ "name": "Food" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let food = id_of(&response.json::<Value>());

        let response = server
            .post("/api/categories")
            .json(&json!({ "name": "Tea", "parent_id": food, "color": "#0a0" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let tea = id_of(&response.json::<Value>());

        let body: Value = server.get("/api/categories?tree=true").await.json();
        assert_eq!(body["meta"]["total"], 1);
        let roots = body["data"].as_array().unwrap();
        assert_eq!(roots[0]["name"], "Food");
        assert_eq!(roots[0]["level"], 0);
        assert_eq!(roots[0]["children"][0]["name"], "Tea");
        assert_eq!(roots[0]["children"][0]["level"], 1);

        let body: Value = server.get(&format!("/api/categories/{}/path", tea)).await.json();
        assert_eq!(body["data"]["path"], "Food > Tea");

        let body: Value = server
            .get(&format!("/api/categories/{}/descendant-ids", food))
            .await
            .json();
        let ids = body["data"]["ids"].as_array().unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], json!(food));
    }

    #[tokio::test]
    async fn test_invalid_body_is_rejected() {
        let server = server_for(Uuid::new_v4(), InMemoryCategoryStore::new());

        let response = server
            .post("/api/categories")
            .json(&json!({ "name": "Tea", "color": "green" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = server
            .post("/api/categories")
            .json(&json!({ "name": "   " }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_move_into_descendant_is_rejected() {
        let owner = Uuid::new_v4();
        let root = category(owner, "Root", None, 0);
        let child = category(owner, "Child", Some(root.id), 0);
        let (root_id, child_id) = (root.id, child.id);
        let server = server_for(owner, InMemoryCategoryStore::with_categories([root, child]));

        let body: Value = server
            .post(&format!("/api/categories/{}/move/validate", root_id))
            .json(&json!({ "new_parent_id": child_id }))
            .await
            .json();
        assert_eq!(body["data"]["valid"], false);
        assert_eq!(
            body["data"]["error"],
            "Cannot move category to its own descendant"
        );

        let response = server
            .post(&format!("/api/categories/{}/move", root_id))
            .json(&json!({ "new_parent_id": child_id }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let body: Value = server
            .get(&format!("/api/categories/{}", root_id))
            .await
            .json();
        assert_eq!(body["data"]["parent_id"], Value::Null);
    }

    #[tokio::test]
    async fn test_patch_can_clear_parent() {
        let owner = Uuid::new_v4();
        let root = category(owner, "Root", None, 0);
        let child = category(owner, "Child", Some(root.id), 0);
        let child_id = child.id;
        let server = server_for(owner, InMemoryCategoryStore::with_categories([root, child]));

        let response = server
            .patch(&format!("/api/categories/{}", child_id))
            .json(&json!({ "parent_id": null }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["parent_id"], Value::Null);
        assert_eq!(body["data"]["name"], "Child");
    }

    #[tokio::test]
    async fn test_delete_promotes_children() {
        let owner = Uuid::new_v4();
        let root = category(owner, "Root", None, 0);
        let middle = category(owner, "Middle", Some(root.id), 0);
        let leaf = category(owner, "Leaf", Some(middle.id), 0);
        let (root_id, middle_id, leaf_id) = (root.id, middle.id, leaf.id);
        let server = server_for(
            owner,
            InMemoryCategoryStore::with_categories([root, middle, leaf]),
        );

        let response = server
            .delete(&format!("/api/categories/{}", middle_id))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["promoted_to"], json!(root_id));
        assert_eq!(body["data"]["reparented"][0]["id"], json!(leaf_id));

        let body: Value = server
            .get(&format!("/api/categories/{}/children", root_id))
            .await
            .json();
        assert_eq!(body["data"][0]["name"], "Leaf");

        let response = server
            .delete(&format!("/api/categories/{}", middle_id))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_owner_sees_nothing() {
        let owner = Uuid::new_v4();
        let mine = category(owner, "Mine", None, 0);
        let mine_id = mine.id;
        let server = server_for(Uuid::new_v4(), InMemoryCategoryStore::with_categories([mine]));

        let response = server.get(&format!("/api/categories/{}", mine_id)).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        let body: Value = server.get("/api/categories").await.json();
        assert_eq!(body["data"], json!([]));
    }
}
