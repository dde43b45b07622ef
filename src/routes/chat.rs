use axum::{extract::State, Extension, Json};
use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::Feedback,
    routes::AppState,
    services::{adaptor, Intent, RecommendationSet, ScoredAnime},
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: Uuid,
    pub message: String,
    /// Optional thumbs up/down on the previous reply
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub intent: Intent,
    pub confidence: f64,
    pub reasoning: String,
    pub recommendations: Vec<ScoredAnime>,
}

/// Handler for the chat endpoint
///
/// Runs the full pipeline: classify and recommend against the stored
/// profile, compose and style the reply, fold the interaction back into the
/// profile, and write the profile back.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    if request.message.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Chat message cannot be empty".to_string(),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        user_id = %request.user_id,
        "Processing chat message"
    );

    let mut profile = state.profile_store.load_or_default(request.user_id).await?;
    let mut rng = StdRng::from_entropy();

    let result = state
        .recommender
        .generate(&request.message, &profile, &mut rng, Utc::now())
        .await?;

    let reply = adaptor::adapt_response_style(&compose_reply(&result), &profile, &mut rng);
    adaptor::update_from_interaction(&mut profile, &request.message, &reply, request.feedback);

    state.profile_store.save(&profile).await?;

    tracing::info!(
        request_id = %request_id,
        intent = %result.intent,
        recommended = result.recommendations.len(),
        "Chat reply composed"
    );

    Ok(Json(ChatResponse {
        reply,
        intent: result.intent,
        confidence: result.confidence,
        reasoning: result.reasoning,
        recommendations: result.recommendations,
    }))
}

/// Builds the raw reply text the behavioral adaptor then styles
fn compose_reply(result: &RecommendationSet) -> String {
    if result.recommendations.is_empty() {
        return "I couldn't find anything new that fits right now. \
                Want to try a different genre or mood?"
            .to_string();
    }

    let titles: Vec<&str> = result
        .recommendations
        .iter()
        .map(|scored| scored.anime.title.as_str())
        .collect();

    format!("{} How about: {}?", result.reasoning, titles.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Anime, AnimeId};

    fn scored(title: &str) -> ScoredAnime {
        ScoredAnime {
            anime: Anime {
                id: AnimeId::Anilist(1),
                title: title.to_string(),
                genres: vec![],
                average_score: Some(80),
                episodes: Some(12),
                season_year: Some(2024),
                synopsis: None,
                cover_url: None,
            },
            adaptive_score: 8.0,
        }
    }

    #[test]
    fn test_compose_reply_lists_titles() {
        let result = RecommendationSet {
            recommendations: vec![scored("Frieren"), scored("Mushishi")],
            intent: Intent::Recommendation,
            reasoning: "Picked from your favorite genres: Fantasy.".to_string(),
            confidence: 0.9,
        };

        let reply = compose_reply(&result);
        assert!(reply.contains("Frieren, Mushishi"));
        assert!(reply.starts_with("Picked from your favorite genres"));
    }

    #[test]
    fn test_compose_reply_empty_set() {
        let result = RecommendationSet {
            recommendations: vec![],
            intent: Intent::Discovery,
            reasoning: "reasoning".to_string(),
            confidence: 0.8,
        };

        let reply = compose_reply(&result);
        assert!(reply.contains("couldn't find anything"));
    }
}
