//! HTTP routes

use axum::{extract::State, routing::get, Json, Router};
use model_link::Model;

use crate::AppState;

/// Returned by `GET /` once the server is up
pub const STATUS_MESSAGE: &str = "App connected to the database";

async fn status() -> &'static str {
    STATUS_MESSAGE
}

/// Registered models with their attributes and associations
async fn models(State(state): State<AppState>) -> Json<Vec<Model>> {
    Json(state.client.models().models().cloned().collect())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(status))
        .route("/models", get(models))
}
