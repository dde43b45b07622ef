use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::ProfileStore;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::services::{AdaptiveRecommender, AnimeProvider};

pub mod actions;
pub mod chat;
pub mod profiles;
pub mod search;

/// Shared application state
pub struct AppState {
    pub recommender: AdaptiveRecommender,
    pub provider: Arc<dyn AnimeProvider>,
    pub profile_store: Arc<dyn ProfileStore>,
}

impl AppState {
    pub fn new(provider: Arc<dyn AnimeProvider>, profile_store: Arc<dyn ProfileStore>) -> Self {
        Self {
            recommender: AdaptiveRecommender::new(provider.clone()),
            provider,
            profile_store,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
        // TraceLayer's span reads the id the request-id middleware inserts,
        // so the id layer must sit outside it
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/actions", post(actions::record_action))
        .route("/profiles/:user_id", get(profiles::get_profile))
        .route("/anime/search", get(search::search))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
