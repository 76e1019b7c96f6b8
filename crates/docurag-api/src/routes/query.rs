//! `POST /query` and `POST /query/stream`: the conversational chat loop
//! over `docurag_query::QueryEngine`. Thin adapter — everything past
//! request parsing is delegated to 4.L.

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::routing::post;
use axum::Json;
use docurag_query::{QueryEngine, QueryEvent, QueryRequest as EngineRequest};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryBody {
    pub query: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub is_temporary: bool,
    #[serde(default = "default_true")]
    pub include_chunks: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SourceDto {
    pub document_id: uuid::Uuid,
    pub document_name: String,
    pub excerpt: String,
    pub full_text: String,
    pub path: String,
    pub score: f32,
}

impl SourceDto {
    fn from_source(source: docurag_query::Source, include_chunks: bool) -> Self {
        Self {
            document_id: source.document_id,
            document_name: source.document_name,
            excerpt: source.excerpt,
            full_text: if include_chunks { source.full_text } else { String::new() },
            path: source.path,
            score: source.score,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponseBody {
    pub answer: String,
    pub sources: Vec<SourceDto>,
    pub session_id: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/query/stream", post(query_stream))
        .with_state(state)
}

fn to_engine_request(body: QueryBody) -> EngineRequest {
    EngineRequest {
        query: body.query,
        session_id: body.session_id,
        is_temporary: body.is_temporary,
    }
}

#[utoipa::path(post, path = "/query", request_body = QueryBody, responses((status = 200, body = QueryResponseBody)))]
async fn query(State(state): State<AppState>, Json(body): Json<QueryBody>) -> Result<Json<QueryResponseBody>> {
    let include_chunks = body.include_chunks;
    let response = state.query_engine.query(to_engine_request(body)).await.map_err(Error::from)?;
    Ok(Json(QueryResponseBody {
        answer: response.answer,
        sources: response
            .sources
            .into_iter()
            .map(|s| SourceDto::from_source(s, include_chunks))
            .collect(),
        session_id: response.session_id,
    }))
}

#[utoipa::path(post, path = "/query/stream", request_body = QueryBody, responses((status = 200)))]
async fn query_stream(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Sse<impl Stream<Item = std::result::Result<Event, std::convert::Infallible>>> {
    let include_chunks = body.include_chunks;
    let engine: std::sync::Arc<QueryEngine> = state.query_engine.clone();
    let events = engine.query_stream(to_engine_request(body));

    let sse_events = events.map(move |event| {
        let event = match event {
            QueryEvent::Token(token) => Event::default().event("token").data(token),
            QueryEvent::Sources(sources) => {
                let dtos: Vec<SourceDto> = sources
                    .into_iter()
                    .map(|s| SourceDto::from_source(s, include_chunks))
                    .collect();
                Event::default()
                    .event("sources")
                    .data(serde_json::to_string(&dtos).unwrap_or_default())
            }
            QueryEvent::Done => Event::default().event("done").data(""),
            QueryEvent::Error(message) => Event::default().event("error").data(message),
        };
        Ok(event)
    });

    Sse::new(sse_events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use tower::ServiceExt;

    #[tokio::test]
    async fn query_against_unreachable_llm_surfaces_as_server_error() {
        let state = test_state();
        let app = routes(state);
        let body = serde_json::json!({ "query": "what's in the report?" });
        let response = app
            .oneshot(
                axum::http::Request::post("/query")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn include_chunks_false_strips_full_text() {
        let dto = SourceDto::from_source(
            docurag_query::Source {
                document_id: uuid::Uuid::new_v4(),
                document_name: "report.pdf".to_string(),
                excerpt: "short…".to_string(),
                full_text: "the whole chunk text".to_string(),
                path: "/data/x/report.pdf".to_string(),
                score: 0.9,
            },
            false,
        );
        assert!(dto.full_text.is_empty());
    }
}
