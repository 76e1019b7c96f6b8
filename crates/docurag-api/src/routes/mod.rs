pub mod batches;
pub mod chat;
pub mod config;
pub mod documents;
pub mod files;
pub mod health;
pub mod models;
pub mod query;
pub mod response;
pub mod upload;

pub use response::{HasStatus, ResponseStatus};

use axum::Router;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(config::routes(state.clone()))
        .merge(models::routes(state.clone()))
        .merge(query::routes(state.clone()))
        .merge(upload::routes(state.clone()))
        .merge(files::routes(state.clone()))
        .merge(batches::routes(state.clone()))
        .merge(documents::routes(state.clone()))
        .merge(chat::routes(state))
        .merge(crate::openapi::swagger_ui())
        .route(
            "/api-docs/openapi.json",
            axum::routing::get(crate::openapi::openapi_json),
        )
}
