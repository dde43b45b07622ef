use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Tone, UserProfile},
    routes::AppState,
    services::taste,
};

/// One genre's standing in the user's taste profile
#[derive(Debug, Serialize)]
pub struct GenreSummary {
    pub genre: String,
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub user_id: Uuid,
    pub top_genres: Vec<GenreSummary>,
    pub engagement_score: f64,
    pub preferred_tone: Tone,
    pub total_interactions: u32,
    pub completed_count: usize,
    pub recent_themes: Vec<String>,
}

impl From<&UserProfile> for ProfileSummary {
    fn from(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id,
            top_genres: taste::top_genres(profile, 5)
                .into_iter()
                .map(|(genre, weight)| GenreSummary { genre, weight })
                .collect(),
            engagement_score: profile.interaction_stats.engagement_score,
            preferred_tone: profile.interaction_stats.preferred_tone,
            total_interactions: profile.interaction_stats.total_interactions,
            completed_count: profile.completed.len(),
            recent_themes: profile.recent_themes.clone(),
        }
    }
}

/// Handler returning a user's taste summary
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ProfileSummary>> {
    let profile = state
        .profile_store
        .load(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No profile for user {}", user_id)))?;

    Ok(Json(ProfileSummary::from(&profile)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TasteVector;
    use chrono::Utc;

    #[test]
    fn test_summary_from_profile() {
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.taste_vectors.insert(
            "Action".to_string(),
            TasteVector {
                weight: 0.9,
                confidence: 0.8,
                last_updated: Utc::now(),
                interactions: 4,
            },
        );
        profile.record_theme("mood".to_string());

        let summary = ProfileSummary::from(&profile);
        assert_eq!(summary.top_genres.len(), 1);
        assert_eq!(summary.top_genres[0].genre, "Action");
        assert_eq!(summary.recent_themes, vec!["mood".to_string()]);
    }
}
