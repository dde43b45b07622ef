//! Adaptive recommendation pipeline: intent classification, genre selection,
//! candidate fetch, engagement-tiered filtering, and taste-weighted ranking.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{Anime, UserProfile};
use crate::services::intent::{Intent, IntentClassifier};
use crate::services::providers::AnimeProvider;
use crate::services::taste;

/// Candidates requested from the metadata provider per query
const CANDIDATE_POOL: usize = 12;

/// Maximum recommendations returned to the caller
const MAX_RECOMMENDATIONS: usize = 6;

/// Mood keyword -> genre table, checked by literal substring match
const MOOD_GENRES: &[(&str, [&str; 3])] = &[
    ("sad", ["Drama", "Slice of Life", "Romance"]),
    ("happy", ["Comedy", "Adventure", "Slice of Life"]),
    ("excited", ["Action", "Sports", "Thriller"]),
    ("tired", ["Slice of Life", "Comedy", "Fantasy"]),
    ("bored", ["Thriller", "Mystery", "Psychological"]),
];

/// Fallback mood when no keyword matches
const RELAXED_GENRES: [&str; 3] = ["Slice of Life", "Comedy", "Adventure"];

/// Genre set for users with no taste history at all
const DEFAULT_GENRES: [&str; 3] = ["Action", "Comedy", "Drama"];

/// One ranked candidate with its combined score
#[derive(Debug, Clone, Serialize)]
pub struct ScoredAnime {
    #[serde(flatten)]
    pub anime: Anime,
    pub adaptive_score: f64,
}

/// Result of one recommendation request, recomputed per message
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<ScoredAnime>,
    pub intent: Intent,
    pub reasoning: String,
    pub confidence: f64,
}

/// Orchestrates the recommendation pipeline over a user profile
///
/// The pipeline reads the profile but never mutates it; taste updates arrive
/// through the action endpoint and stat updates through the behavioral
/// adaptor. An empty candidate list is a valid outcome, not an error.
pub struct AdaptiveRecommender {
    classifier: IntentClassifier,
    provider: Arc<dyn AnimeProvider>,
}

impl AdaptiveRecommender {
    pub fn new(provider: Arc<dyn AnimeProvider>) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            provider,
        }
    }

    /// Runs the full pipeline for one chat message
    pub async fn generate<R: Rng>(
        &self,
        message: &str,
        profile: &UserProfile,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> AppResult<RecommendationSet> {
        // 1. Classify, biased toward the conversation's running theme
        let last_intent = profile.last_theme().and_then(Intent::from_theme);
        let classification = self.classifier.classify(message, last_intent);

        tracing::info!(
            user_id = %profile.user_id,
            intent = %classification.intent,
            confidence = classification.confidence,
            "Intent classified"
        );

        // 2. Pick the genre set for this intent
        let genres = self.select_genres(classification.intent, message, profile, rng);

        // 3. Fetch candidates from the metadata provider
        let candidates = self
            .provider
            .fetch_by_genres(&genres, CANDIDATE_POOL)
            .await?;

        tracing::info!(
            genres = ?genres,
            fetched = candidates.len(),
            provider = self.provider.name(),
            "Candidates fetched"
        );

        // 4. Filter by watch history and engagement-tiered score floor
        let engagement = profile.interaction_stats.engagement_score;
        let filtered = filter_candidates(candidates, profile);

        // 5. Rank by taste-weighted adaptive score
        let mut ranked: Vec<ScoredAnime> = filtered
            .into_iter()
            .map(|anime| {
                let adaptive_score = score_candidate(&anime, profile, classification.intent, now);
                ScoredAnime {
                    anime,
                    adaptive_score,
                }
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.adaptive_score
                .partial_cmp(&a.adaptive_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(MAX_RECOMMENDATIONS);

        tracing::info!(
            user_id = %profile.user_id,
            recommended = ranked.len(),
            "Recommendations ranked"
        );

        // 6. Attach a reasoning line for the reply composer
        let reasoning = reasoning_for(classification.intent, engagement, &genres);

        Ok(RecommendationSet {
            recommendations: ranked,
            intent: classification.intent,
            reasoning,
            confidence: classification.confidence,
        })
    }

    /// Chooses the genre set to query for, by intent
    fn select_genres<R: Rng>(
        &self,
        intent: Intent,
        message: &str,
        profile: &UserProfile,
        rng: &mut R,
    ) -> Vec<String> {
        let mut genres = match intent {
            // Blend the user's strongest tastes with one serendipity slot
            Intent::Recommendation => {
                let mut genres: Vec<String> = taste::top_genres(profile, 2)
                    .into_iter()
                    .map(|(genre, _)| genre)
                    .collect();
                genres.extend(taste::exploration_genres(profile, 1, rng));
                genres
            }
            // Lean into the unknown, anchored by one known taste
            Intent::Discovery => {
                let mut genres = taste::exploration_genres(profile, 2, rng);
                genres.extend(
                    taste::top_genres(profile, 1)
                        .into_iter()
                        .map(|(genre, _)| genre),
                );
                genres
            }
            Intent::MoodBased => mood_genres(message),
            Intent::Comparison | Intent::Chat => taste::top_genres(profile, 3)
                .into_iter()
                .map(|(genre, _)| genre)
                .collect(),
        };

        if genres.is_empty() {
            genres = DEFAULT_GENRES.iter().map(|g| g.to_string()).collect();
        }

        let mut seen = std::collections::HashSet::new();
        genres.retain(|genre| seen.insert(genre.clone()));
        genres
    }
}

/// Detects the user's mood by literal substring match against the mood table
fn mood_genres(message: &str) -> Vec<String> {
    let lowered = message.to_lowercase();

    for (mood, genres) in MOOD_GENRES {
        if lowered.contains(mood) {
            return genres.iter().map(|g| g.to_string()).collect();
        }
    }

    // No recognizable mood: assume the user wants to unwind
    RELAXED_GENRES.iter().map(|g| g.to_string()).collect()
}

/// Minimum community score a candidate must exceed, by engagement tier
///
/// Low-engagement users get only safe, highly-rated picks; highly engaged
/// users tolerate deeper cuts.
fn score_floor(engagement: f64) -> u32 {
    if engagement < 0.3 {
        70
    } else if engagement > 0.7 {
        60
    } else {
        65
    }
}

/// Drops already-watched candidates and those under the score floor
fn filter_candidates(candidates: Vec<Anime>, profile: &UserProfile) -> Vec<Anime> {
    let floor = score_floor(profile.interaction_stats.engagement_score);

    candidates
        .into_iter()
        .filter(|anime| !profile.completed.contains(&anime.id))
        .filter(|anime| anime.average_score.is_some_and(|score| score > floor))
        .collect()
}

/// Combined adaptive score: community score base, taste-weight bonus per
/// matching genre, and an intent-specific adjustment
fn score_candidate(
    anime: &Anime,
    profile: &UserProfile,
    intent: Intent,
    now: DateTime<Utc>,
) -> f64 {
    let mut score = anime.average_score.unwrap_or(0) as f64 / 10.0;

    for genre in &anime.genres {
        if let Some(taste) = profile.taste_vectors.get(genre) {
            score += taste.weight * 2.0;
        }
    }

    match intent {
        // Newer seasons score higher, fading linearly over five years
        Intent::Discovery => {
            if let Some(year) = anime.season_year {
                let age_years = (now.year() - year).max(0) as f64;
                score += (1.0 - age_years / 5.0).max(0.0);
            }
        }
        // Short series suit mood watching
        Intent::MoodBased => {
            if anime.episodes.is_some_and(|eps| eps <= 12) {
                score += 1.0;
            }
        }
        _ => {}
    }

    score
}

/// Templated reasoning line, keyed by intent and engagement tier
fn reasoning_for(intent: Intent, engagement: f64, genres: &[String]) -> String {
    let genre_list = genres.join(", ");

    match intent {
        Intent::Recommendation => {
            if engagement > 0.7 {
                format!(
                    "You've been loving {} lately, so I leaned into that with one wildcard.",
                    genre_list
                )
            } else if engagement < 0.3 {
                format!("Safe bets first: highly rated picks from {}.", genre_list)
            } else {
                format!("Picked from your favorite genres: {}.", genre_list)
            }
        }
        Intent::Discovery => format!(
            "Stepping off your beaten path with {} to find something fresh.",
            genre_list
        ),
        Intent::MoodBased => format!("Matched to your mood: {}.", genre_list),
        Intent::Comparison => format!(
            "Pulled comparable titles across {} so you can weigh them.",
            genre_list
        ),
        Intent::Chat => {
            if engagement > 0.7 {
                format!("Since you're here, a few {} picks you might enjoy.", genre_list)
            } else {
                format!("Some well-rated {} titles, in case you're browsing.", genre_list)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnimeId, TasteVector};
    use mockall::mock;
    use rand::{rngs::StdRng, SeedableRng};
    use uuid::Uuid;

    mock! {
        Provider {}

        #[async_trait::async_trait]
        impl AnimeProvider for Provider {
            async fn fetch_by_genres(&self, genres: &[String], count: usize) -> AppResult<Vec<Anime>>;
            async fn search(&self, query: &str) -> AppResult<Vec<Anime>>;
            fn name(&self) -> &'static str;
        }
    }

    fn candidate(id: u64, genres: &[&str], score: u32, episodes: u32, year: i32) -> Anime {
        Anime {
            id: AnimeId::Anilist(id),
            title: format!("Anime #{}", id),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            average_score: Some(score),
            episodes: Some(episodes),
            season_year: Some(year),
            synopsis: None,
            cover_url: None,
        }
    }

    fn profile_with_action_taste(weight: f64, confidence: f64) -> UserProfile {
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.taste_vectors.insert(
            "Action".to_string(),
            TasteVector {
                weight,
                confidence,
                last_updated: Utc::now(),
                interactions: 5,
            },
        );
        profile
    }

    #[tokio::test]
    async fn test_recommendation_end_to_end() {
        let mut mock = MockProvider::new();
        mock.expect_fetch_by_genres()
            .returning(|_, _| Ok(vec![candidate(1, &["Action"], 80, 12, 2024)]));
        mock.expect_name().returning(|| "mock");

        let recommender = AdaptiveRecommender::new(Arc::new(mock));
        let profile = profile_with_action_taste(0.9, 0.9);
        let mut rng = StdRng::seed_from_u64(1);

        let result = recommender
            .generate("recommend me something", &profile, &mut rng, Utc::now())
            .await
            .unwrap();

        assert_eq!(result.intent, Intent::Recommendation);
        assert!(result.confidence >= 0.7);
        assert_eq!(result.recommendations.len(), 1);

        // 80/10 base + 0.9 weight * 2 genre bonus
        let score = result.recommendations[0].adaptive_score;
        assert!((score - 9.8).abs() < 1e-9);
        assert!(!result.reasoning.is_empty());
    }

    #[tokio::test]
    async fn test_recommendation_genre_selection_includes_top_taste() {
        let mut mock = MockProvider::new();
        mock.expect_fetch_by_genres()
            .withf(|genres: &[String], _| genres.contains(&"Action".to_string()))
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_name().returning(|| "mock");

        let recommender = AdaptiveRecommender::new(Arc::new(mock));
        let profile = profile_with_action_taste(0.9, 0.9);
        let mut rng = StdRng::seed_from_u64(1);

        let result = recommender
            .generate("recommend me something", &profile, &mut rng, Utc::now())
            .await
            .unwrap();
        assert!(result.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_completed_anime_filtered_out() {
        let mut mock = MockProvider::new();
        mock.expect_fetch_by_genres()
            .returning(|_, _| Ok(vec![candidate(7, &["Action"], 90, 24, 2020)]));
        mock.expect_name().returning(|| "mock");

        let recommender = AdaptiveRecommender::new(Arc::new(mock));
        let mut profile = profile_with_action_taste(0.9, 0.9);
        profile.mark_completed(AnimeId::Anilist(7));
        let mut rng = StdRng::seed_from_u64(1);

        let result = recommender
            .generate("recommend me something", &profile, &mut rng, Utc::now())
            .await
            .unwrap();
        assert!(result.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_results_capped_at_six() {
        let mut mock = MockProvider::new();
        mock.expect_fetch_by_genres().returning(|_, _| {
            Ok((1..=12)
                .map(|i| candidate(i, &["Action"], 70 + i as u32, 12, 2020))
                .collect())
        });
        mock.expect_name().returning(|| "mock");

        let recommender = AdaptiveRecommender::new(Arc::new(mock));
        let profile = profile_with_action_taste(0.5, 0.5);
        let mut rng = StdRng::seed_from_u64(1);

        let result = recommender
            .generate("recommend me something", &profile, &mut rng, Utc::now())
            .await
            .unwrap();

        assert_eq!(result.recommendations.len(), MAX_RECOMMENDATIONS);
        // Sorted descending by adaptive score
        for pair in result.recommendations.windows(2) {
            assert!(pair[0].adaptive_score >= pair[1].adaptive_score);
        }
    }

    #[test]
    fn test_score_floor_tiers() {
        assert_eq!(score_floor(0.2), 70);
        assert_eq!(score_floor(0.5), 65);
        assert_eq!(score_floor(0.8), 60);
    }

    #[test]
    fn test_engagement_tier_filtering() {
        let anime = candidate(1, &["Action"], 68, 12, 2024);

        let mut low = UserProfile::new(Uuid::new_v4());
        low.interaction_stats.engagement_score = 0.2;
        assert!(filter_candidates(vec![anime.clone()], &low).is_empty());

        let mut high = UserProfile::new(Uuid::new_v4());
        high.interaction_stats.engagement_score = 0.8;
        assert_eq!(filter_candidates(vec![anime], &high).len(), 1);
    }

    #[test]
    fn test_candidate_without_score_filtered() {
        let mut anime = candidate(1, &["Action"], 90, 12, 2024);
        anime.average_score = None;

        let profile = UserProfile::new(Uuid::new_v4());
        assert!(filter_candidates(vec![anime], &profile).is_empty());
    }

    #[test]
    fn test_mood_genres_sad() {
        assert_eq!(
            mood_genres("I'm feeling sad today"),
            vec![
                "Drama".to_string(),
                "Slice of Life".to_string(),
                "Romance".to_string()
            ]
        );
    }

    #[test]
    fn test_mood_genres_default_relaxed() {
        assert_eq!(
            mood_genres("just got home from work"),
            vec![
                "Slice of Life".to_string(),
                "Comedy".to_string(),
                "Adventure".to_string()
            ]
        );
    }

    #[test]
    fn test_discovery_bonus_decays_over_five_years() {
        let profile = UserProfile::new(Uuid::new_v4());
        let now = Utc::now();
        let this_year = now.year();

        let fresh = candidate(1, &[], 80, 12, this_year);
        let stale = candidate(2, &[], 80, 12, this_year - 10);

        let fresh_score = score_candidate(&fresh, &profile, Intent::Discovery, now);
        let stale_score = score_candidate(&stale, &profile, Intent::Discovery, now);

        assert!((fresh_score - 9.0).abs() < 1e-9);
        // Bonus bottoms out at zero, never negative
        assert!((stale_score - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_mood_bonus_for_short_series() {
        let profile = UserProfile::new(Uuid::new_v4());
        let now = Utc::now();

        let short = candidate(1, &[], 80, 12, 2020);
        let long = candidate(2, &[], 80, 24, 2020);

        let short_score = score_candidate(&short, &profile, Intent::MoodBased, now);
        let long_score = score_candidate(&long, &profile, Intent::MoodBased, now);

        assert!((short_score - long_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reasoning_varies_by_engagement() {
        let genres = vec!["Action".to_string()];
        let low = reasoning_for(Intent::Recommendation, 0.2, &genres);
        let mid = reasoning_for(Intent::Recommendation, 0.5, &genres);
        let high = reasoning_for(Intent::Recommendation, 0.8, &genres);

        assert_ne!(low, mid);
        assert_ne!(mid, high);
        assert!(low.contains("Action"));
    }
}
