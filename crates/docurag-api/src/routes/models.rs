//! `GET /models/info`: which LLM/embedding/reranker models the server is
//! actually configured with, useful for a client to show in a UI or to
//! sanity-check a deployment.

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ModelsInfoResponse {
    pub llm_model: String,
    pub llm_hosting: String,
    pub embedding_model: String,
    pub reranker_model: Option<String>,
    pub reranker_enabled: bool,
}

pub fn routes(state: AppState) -> Router {
    Router::new().route("/models/info", get(get_models_info)).with_state(state)
}

async fn get_models_info(State(state): State<AppState>) -> Json<ModelsInfoResponse> {
    let config = &state.config;
    Json(ModelsInfoResponse {
        llm_model: config.llm.model.clone(),
        llm_hosting: config.llm.provider.clone(),
        embedding_model: config.embedding.model.clone(),
        reranker_model: config.reranker.enabled.then(|| config.reranker.model.clone()),
        reranker_enabled: config.reranker.enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use tower::ServiceExt;

    #[tokio::test]
    async fn reports_configured_model_names() {
        let state = test_state();
        let app = routes(state);
        let response = app
            .oneshot(axum::http::Request::get("/models/info").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ModelsInfoResponse = serde_json::from_slice(&body).unwrap();
        assert!(!parsed.llm_model.is_empty());
        assert!(!parsed.embedding_model.is_empty());
    }
}
