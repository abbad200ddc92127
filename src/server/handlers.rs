// file: src/server/handlers.rs
// description: http handlers mapping requests onto the qa application
// reference: https://docs.rs/axum

use crate::app::QaApplication;
use crate::error::QaError;
use crate::server::page::INDEX_HTML;
use crate::server::types::{ErrorResponse, HistoryResponse, QueryRequest, QueryResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<QaApplication>,
}

fn error_response(err: &QaError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        error!("Request failed: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorResponse::from(err))).into_response()
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!("Rejected query body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("VALIDATION", rejection.body_text())),
            )
                .into_response();
        }
    };

    debug!(
        "HTTP query request: chars={}, k_summaries={:?}, k_chunks={:?}",
        request.query.chars().count(),
        request.k_summaries,
        request.k_chunks
    );

    match state
        .app
        .get_answer(&request.query, request.k_summaries, request.k_chunks)
        .await
    {
        Ok(entry) => (StatusCode::OK, Json(QueryResponse::from(&entry))).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let entries = state
        .app
        .history()
        .await
        .iter()
        .map(QueryResponse::from)
        .collect();
    Json(HistoryResponse { entries })
}

pub async fn health(State(state): State<AppState>) -> Response {
    let report = state.app.health().await;
    let status = if report.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(report)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::offline_app;
    use axum::body::{Body, to_bytes};
    use axum::extract::FromRequest;
    use axum::http::Request;
    use tempfile::TempDir;

    async fn state(temp: &TempDir) -> AppState {
        AppState {
            app: Arc::new(offline_app(temp, 10).await),
        }
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(query: &str) -> QueryRequest {
        QueryRequest {
            query: query.to_string(),
            k_summaries: None,
            k_chunks: None,
        }
    }

    #[tokio::test]
    async fn test_index_page_has_form() {
        let Html(page) = index().await;
        assert!(page.contains("Hierarchical Q&amp;A System"));
        assert!(page.contains("Get Answer"));
    }

    #[tokio::test]
    async fn test_health_is_ok() {
        let temp = TempDir::new().unwrap();
        let response = health(State(state(&temp).await)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_query_is_bad_request() {
        let temp = TempDir::new().unwrap();
        let response = query(State(state(&temp).await), Ok(Json(request("  ")))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.code, "VALIDATION");
    }

    #[tokio::test]
    async fn test_query_then_history() {
        let temp = TempDir::new().unwrap();
        let state = state(&temp).await;

        let response = query(State(state.clone()), Ok(Json(request("binary heap")))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let answer: QueryResponse = body_json(response).await;
        assert_eq!(answer.query, "binary heap");
        assert!(!answer.results.is_empty());

        let Json(history) = history(State(state)).await;
        assert_eq!(history.entries.len(), 1);
        assert_eq!(history.entries[0].id, answer.id);
    }

    #[tokio::test]
    async fn test_missing_document_is_server_error() {
        let temp = TempDir::new().unwrap();
        let mut config = crate::config::Config::offline();
        config.storage.uri = temp.path().join("stores").display().to_string();
        config.document.path = temp.path().join("absent.pdf");
        let app = QaApplication::new(config).await.unwrap();
        let state = AppState { app: Arc::new(app) };

        let response = query(State(state), Ok(Json(request("anything")))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_bad_request() {
        let temp = TempDir::new().unwrap();
        let req = Request::builder()
            .method("POST")
            .uri("/api/query")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let payload = Json::<QueryRequest>::from_request(req, &()).await;
        assert!(payload.is_err());

        let response = query(State(state(&temp).await), payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.code, "VALIDATION");
        assert!(body.message.contains("query"));
    }
}
