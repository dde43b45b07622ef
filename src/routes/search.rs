use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{error::AppResult, models::Anime, routes::AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Handler for anime title search
///
/// Thin pass-through to the configured metadata provider; results come back
/// already normalized and are cached at the provider layer.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Anime>>> {
    let results = state.provider.search(&params.q).await?;
    Ok(Json(results))
}
