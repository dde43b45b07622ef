//! Taste vector maintenance: passive time decay, action-driven weight
//! updates, and top/exploration genre selection.
//!
//! All operations mutate the in-memory profile passed in; persisting the
//! result is the caller's responsibility.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::BTreeSet;

use crate::models::{Action, AnimeId, TasteVector, UserProfile};

/// Confidence gained per interaction with a genre
const CONFIDENCE_STEP: f64 = 0.05;

/// Genres untouched for longer than this decay once per elapsed week
const DECAY_GRACE_DAYS: i64 = 7;

/// Genres with fewer interactions than this remain exploration candidates
const EXPLORATION_CUTOFF: u32 = 3;

/// Returned when no exploration candidate survives its Bernoulli trial
const DEFAULT_EXPLORATION: [&str; 2] = ["Slice of Life", "Comedy"];

/// Catalog genres eligible for exploration even before the user has ever
/// interacted with them
const CATALOG_GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Comedy",
    "Drama",
    "Fantasy",
    "Horror",
    "Mystery",
    "Psychological",
    "Romance",
    "Sci-Fi",
    "Slice of Life",
    "Sports",
    "Supernatural",
    "Thriller",
];

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Applies passive time decay to every tracked genre
///
/// Genres unmodified for more than seven days lose weight by
/// `decay_rate^floor(days/7)` and are restamped to `now`. A no-op within the
/// grace window, so repeated calls with the same clock never compound.
pub fn apply_decay(profile: &mut UserProfile, now: DateTime<Utc>) {
    let decay_rate = profile.learning_params.decay_rate;

    for taste in profile.taste_vectors.values_mut() {
        let days = (now - taste.last_updated).num_days();
        if days > DECAY_GRACE_DAYS {
            let periods = (days / DECAY_GRACE_DAYS) as i32;
            taste.weight = clamp01(taste.weight * decay_rate.powi(periods));
            taste.last_updated = now;
        }
    }
}

/// Applies one user action to every genre of the acted-upon anime
///
/// Decay runs first so stale weights are corrected before the update. An
/// empty genre list is a no-op. Genres never seen before are seeded at
/// weight 0.5, confidence 0.1, then updated like any other.
pub fn update_from_action(
    profile: &mut UserProfile,
    action: Action,
    anime_id: AnimeId,
    genres: &[String],
    now: DateTime<Utc>,
) {
    if genres.is_empty() {
        tracing::debug!(user_id = %profile.user_id, ?action, "Action without genres ignored");
        return;
    }

    apply_decay(profile, now);

    let impact = action.impact();
    let learning_rate = profile.learning_params.learning_rate;

    for genre in genres {
        let taste = profile
            .taste_vectors
            .entry(genre.clone())
            .or_insert_with(|| TasteVector::seeded(now));

        taste.weight = clamp01(taste.weight + impact * learning_rate);
        taste.confidence = (taste.confidence + CONFIDENCE_STEP).min(1.0);
        taste.interactions += 1;
        taste.last_updated = now;
    }

    if action.marks_completed() {
        profile.mark_completed(anime_id);
    }

    tracing::debug!(
        user_id = %profile.user_id,
        ?action,
        genres = genres.len(),
        "Taste vectors updated"
    );
}

/// Highest-affinity genres, ranked by `weight * confidence`
///
/// The underlying map is ordered by genre name, so equal affinities resolve
/// in that order. Returns `(genre, weight)` pairs for downstream scoring.
pub fn top_genres(profile: &UserProfile, limit: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(&String, &TasteVector)> = profile.taste_vectors.iter().collect();
    ranked.sort_by(|a, b| {
        b.1.affinity()
            .partial_cmp(&a.1.affinity())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(genre, taste)| (genre.clone(), taste.weight))
        .collect()
}

/// Picks genres the user has barely touched, for serendipity slots
///
/// Each candidate (tracked genres under the interaction cutoff, plus catalog
/// genres never tracked) passes an independent Bernoulli trial gated by the
/// profile's exploration rate. Trials are independent rather than sampling
/// without replacement, so low rates can select nothing; the fixed default
/// pair covers that case.
pub fn exploration_genres<R: Rng>(
    profile: &UserProfile,
    limit: usize,
    rng: &mut R,
) -> Vec<String> {
    let exploration_rate = profile.learning_params.exploration_rate;

    let mut candidates: BTreeSet<&str> = CATALOG_GENRES.iter().copied().collect();
    for (genre, taste) in &profile.taste_vectors {
        if taste.interactions >= EXPLORATION_CUTOFF {
            candidates.remove(genre.as_str());
        } else {
            candidates.insert(genre.as_str());
        }
    }

    let mut selected = Vec::new();
    for genre in candidates {
        if selected.len() >= limit {
            break;
        }
        if rng.gen::<f64>() < exploration_rate {
            selected.push(genre.to_string());
        }
    }

    if selected.is_empty() {
        return DEFAULT_EXPLORATION
            .iter()
            .take(limit)
            .map(|g| g.to_string())
            .collect();
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::{rngs::StdRng, SeedableRng};
    use uuid::Uuid;

    fn profile_with(genre: &str, weight: f64, confidence: f64, now: DateTime<Utc>) -> UserProfile {
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.taste_vectors.insert(
            genre.to_string(),
            TasteVector {
                weight,
                confidence,
                last_updated: now,
                interactions: 5,
            },
        );
        profile
    }

    #[test]
    fn test_unseen_genre_seeded_then_updated() {
        let now = Utc::now();
        let mut profile = UserProfile::new(Uuid::new_v4());

        update_from_action(
            &mut profile,
            Action::Watched,
            AnimeId::Anilist(1),
            &["Action".to_string()],
            now,
        );

        let taste = &profile.taste_vectors["Action"];
        // 0.5 seed + 0.3 impact * 0.3 learning rate
        assert!((taste.weight - 0.59).abs() < 1e-9);
        assert!((taste.confidence - 0.15).abs() < 1e-9);
        assert_eq!(taste.interactions, 1);
    }

    #[test]
    fn test_weights_stay_clamped_for_all_actions() {
        let now = Utc::now();
        let actions = [
            Action::Watched,
            Action::Completed,
            Action::RatedHigh,
            Action::RatedLow,
            Action::Dropped,
            Action::Saved,
            Action::Ignored,
            Action::Other,
        ];

        let mut profile = UserProfile::new(Uuid::new_v4());
        let genres = vec!["Action".to_string(), "Drama".to_string()];

        for round in 0..50 {
            let action = actions[round % actions.len()];
            update_from_action(&mut profile, action, AnimeId::Anilist(round as u64), &genres, now);

            for taste in profile.taste_vectors.values() {
                assert!((0.0..=1.0).contains(&taste.weight));
                assert!((0.0..=1.0).contains(&taste.confidence));
            }
        }
    }

    #[test]
    fn test_interactions_monotonically_increase() {
        let now = Utc::now();
        let mut profile = UserProfile::new(Uuid::new_v4());
        let genres = vec!["Romance".to_string()];

        let mut last = 0;
        for i in 0..10 {
            update_from_action(&mut profile, Action::Dropped, AnimeId::Mal(i), &genres, now);
            let current = profile.taste_vectors["Romance"].interactions;
            assert!(current > last);
            last = current;
        }
    }

    #[test]
    fn test_empty_genres_is_noop() {
        let now = Utc::now();
        let mut profile = UserProfile::new(Uuid::new_v4());
        update_from_action(&mut profile, Action::Completed, AnimeId::Anilist(1), &[], now);
        assert!(profile.taste_vectors.is_empty());
        assert!(profile.completed.is_empty());
    }

    #[test]
    fn test_completed_action_records_history() {
        let now = Utc::now();
        let mut profile = UserProfile::new(Uuid::new_v4());
        update_from_action(
            &mut profile,
            Action::Completed,
            AnimeId::Anilist(42),
            &["Action".to_string()],
            now,
        );
        assert_eq!(profile.completed, vec![AnimeId::Anilist(42)]);
    }

    #[test]
    fn test_decay_noop_within_grace_window() {
        let now = Utc::now();
        let mut profile = profile_with("Action", 0.8, 0.9, now - Duration::days(7));

        apply_decay(&mut profile, now);
        assert_eq!(profile.taste_vectors["Action"].weight, 0.8);

        // Twice with zero elapsed time still changes nothing
        apply_decay(&mut profile, now);
        apply_decay(&mut profile, now);
        assert_eq!(profile.taste_vectors["Action"].weight, 0.8);
    }

    #[test]
    fn test_decay_applies_per_elapsed_week() {
        let now = Utc::now();
        let mut profile = profile_with("Action", 0.8, 0.9, now - Duration::days(15));

        apply_decay(&mut profile, now);

        // 15 days -> two decay periods at the default 0.95 rate
        let expected = 0.8 * 0.95 * 0.95;
        let taste = &profile.taste_vectors["Action"];
        assert!((taste.weight - expected).abs() < 1e-9);
        assert_eq!(taste.last_updated, now);

        // Restamped to now, so a second pass is a no-op
        apply_decay(&mut profile, now);
        assert!((profile.taste_vectors["Action"].weight - expected).abs() < 1e-9);
    }

    #[test]
    fn test_top_genres_ranked_by_affinity() {
        let now = Utc::now();
        let mut profile = UserProfile::new(Uuid::new_v4());
        for (genre, weight, confidence) in [
            ("Action", 0.9, 0.9),
            ("Comedy", 0.9, 0.5),
            ("Drama", 0.4, 0.9),
        ] {
            profile.taste_vectors.insert(
                genre.to_string(),
                TasteVector {
                    weight,
                    confidence,
                    last_updated: now,
                    interactions: 3,
                },
            );
        }

        let top = top_genres(&profile, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, "Action");
        assert_eq!(top[1].0, "Comedy");
    }

    #[test]
    fn test_top_genres_ties_break_by_map_order() {
        let now = Utc::now();
        let mut profile = UserProfile::new(Uuid::new_v4());
        for genre in ["Sports", "Action", "Mystery"] {
            profile.taste_vectors.insert(
                genre.to_string(),
                TasteVector {
                    weight: 0.6,
                    confidence: 0.5,
                    last_updated: now,
                    interactions: 3,
                },
            );
        }

        let top = top_genres(&profile, 3);
        let names: Vec<&str> = top.iter().map(|(g, _)| g.as_str()).collect();
        assert_eq!(names, vec!["Action", "Mystery", "Sports"]);
    }

    #[test]
    fn test_top_genres_respects_limit() {
        let now = Utc::now();
        let profile = profile_with("Action", 0.9, 0.9, now);
        assert_eq!(top_genres(&profile, 5).len(), 1);
        assert!(top_genres(&profile, 0).is_empty());
    }

    #[test]
    fn test_exploration_selects_under_cutoff_only() {
        let now = Utc::now();
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.learning_params.exploration_rate = 1.0;
        profile.taste_vectors.insert(
            "Action".to_string(),
            TasteVector {
                weight: 0.9,
                confidence: 0.9,
                last_updated: now,
                interactions: 10,
            },
        );

        let mut rng = StdRng::seed_from_u64(7);
        let picks = exploration_genres(&profile, 50, &mut rng);
        assert!(!picks.contains(&"Action".to_string()));
        assert!(!picks.is_empty());
    }

    #[test]
    fn test_exploration_zero_rate_returns_defaults() {
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.learning_params.exploration_rate = 0.0;

        let mut rng = StdRng::seed_from_u64(7);
        let picks = exploration_genres(&profile, 3, &mut rng);
        assert_eq!(
            picks,
            vec!["Slice of Life".to_string(), "Comedy".to_string()]
        );
    }

    #[test]
    fn test_exploration_caps_at_limit() {
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.learning_params.exploration_rate = 1.0;

        let mut rng = StdRng::seed_from_u64(7);
        let picks = exploration_genres(&profile, 2, &mut rng);
        assert_eq!(picks.len(), 2);
    }

    #[test]
    fn test_exploration_deterministic_with_seed() {
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.learning_params.exploration_rate = 0.5;

        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(
            exploration_genres(&profile, 4, &mut a),
            exploration_genres(&profile, 4, &mut b)
        );
    }
}
