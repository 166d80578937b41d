#[cfg(test)]
use crate::core::extractor::OwnerContext;
#[cfg(test)]
use crate::features::categories::models::Category;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};
#[cfg(test)]
use chrono::Utc;
#[cfg(test)]
use fake::{faker::lorem::en::Word, Fake};
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
pub fn category(
    owner_id: Uuid,
    name: &str,
    parent_id: Option<Uuid>,
    display_order: i32,
) -> Category {
    let now = Utc::now();
    Category {
        id: Uuid::new_v4(),
        owner_id,
        parent_id,
        name: name.to_string(),
        description: None,
        icon: None,
        color: None,
        display_order,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Category with a generated name
#[cfg(test)]
pub fn fake_category(owner_id: Uuid, parent_id: Option<Uuid>, display_order: i32) -> Category {
    let name: String = Word().fake();
    category(owner_id, &name, parent_id, display_order)
}

/// Wrap a router so every request runs as `owner_id`, skipping the header
#[cfg(test)]
pub fn with_owner(router: Router, owner_id: Uuid) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| async move {
            request.extensions_mut().insert(OwnerContext { owner_id });
            let response: Response = next.run(request).await;
            response
        },
    ))
}
