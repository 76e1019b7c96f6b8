//! `GET /config`: the subset of server configuration a client needs to
//! know about (today, just the upload size ceiling enforced by
//! `routes::upload`).

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub max_upload_size_mb: u64,
}

pub fn routes(state: AppState) -> Router {
    Router::new().route("/config", get(get_config)).with_state(state)
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        max_upload_size_mb: state.config.max_upload_size_mb,
    })
}
