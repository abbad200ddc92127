// file: src/server/routes.rs
// description: http route table
// reference: https://docs.rs/axum

use crate::server::handlers::{self, AppState};
use axum::{
    Router,
    routing::{get, post},
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/query", post(handlers::query))
        .route("/api/history", get(handlers::history))
        .with_state(state)
}
