//! Product category hierarchy feature.
//!
//! Categories are stored flat, each pointing at an optional parent. Trees,
//! paths and descendant sets are rebuilt from one owner's full snapshot on
//! every request; mutations are validated against that snapshot before any
//! write so the hierarchy never gains a cycle.
//!
//! ## Endpoints
//!
//! All endpoints require the `X-Owner-Id` header.
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/categories` | List categories (flat or `?tree=true`) |
//! | POST | `/api/categories` | Create category |
//! | GET | `/api/categories/{id}` | Get category |
//! | PATCH | `/api/categories/{id}` | Update category |
//! | DELETE | `/api/categories/{id}` | Delete category, promoting its children |
//! | POST | `/api/categories/{id}/move` | Move category |
//! | POST | `/api/categories/{id}/move/validate` | Check a move without applying it |
//! | GET | `/api/categories/{id}/path` | Path string and ancestors |
//! | GET | `/api/categories/{id}/children` | Direct children |
//! | GET | `/api/categories/{id}/descendants` | All descendants |
//! | GET | `/api/categories/{id}/descendant-ids` | Category plus descendant ids |

pub mod dtos;
pub mod handlers;
pub mod hierarchy;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use services::CategoryService;
pub use store::{CategoryStore, InMemoryCategoryStore, PgCategoryStore};
