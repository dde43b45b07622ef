use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Action, AnimeId},
    routes::{profiles::GenreSummary, AppState},
    services::taste,
};

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub user_id: Uuid,
    pub anime_id: AnimeId,
    /// Genres of the acted-upon anime, as reported by the metadata provider
    pub genres: Vec<String>,
    pub action: Action,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub top_genres: Vec<GenreSummary>,
    pub tracked_genres: usize,
}

/// Handler ingesting a watch/rate/drop event into the taste model
///
/// An action without genres is accepted but changes nothing, mirroring the
/// taste store's no-op on malformed input.
pub async fn record_action(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ActionRequest>,
) -> AppResult<Json<ActionResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %request.user_id,
        anime_id = %request.anime_id,
        action = ?request.action,
        "Recording user action"
    );

    let mut profile = state.profile_store.load_or_default(request.user_id).await?;

    taste::update_from_action(
        &mut profile,
        request.action,
        request.anime_id,
        &request.genres,
        Utc::now(),
    );

    state.profile_store.save(&profile).await?;

    let response = ActionResponse {
        top_genres: taste::top_genres(&profile, 5)
            .into_iter()
            .map(|(genre, weight)| GenreSummary { genre, weight })
            .collect(),
        tracked_genres: profile.taste_vectors.len(),
    };

    Ok(Json(response))
}
