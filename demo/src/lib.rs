//! Demo application for model_link
//!
//! A minimal axum server with two related models, `Localidad` and
//! `Provincia`, whose tables are synchronized at startup.

pub mod db;
pub mod routes;

use axum::Router;
use model_link::Client;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<Client>,
}

/// Creates the application router
pub fn create_router(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
