use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::AnimeId;

/// A user action on an anime, each with a fixed signed impact on taste weights
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Watched,
    Completed,
    RatedHigh,
    RatedLow,
    Dropped,
    Saved,
    Ignored,
    /// Catch-all for actions the taste model has no dedicated magnitude for
    #[serde(other)]
    Other,
}

impl Action {
    /// Signed impact magnitude applied to every genre of the acted-upon anime
    pub fn impact(&self) -> f64 {
        match self {
            Action::Watched => 0.3,
            Action::Completed => 0.5,
            Action::RatedHigh => 0.7,
            Action::RatedLow => -0.3,
            Action::Dropped => -0.4,
            Action::Saved => 0.2,
            Action::Ignored => -0.1,
            Action::Other => 0.1,
        }
    }

    /// Whether this action marks the anime as part of the user's watch history
    pub fn marks_completed(&self) -> bool {
        matches!(self, Action::Watched | Action::Completed)
    }
}

/// Explicit feedback attached to a chat interaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Positive,
    Negative,
}

/// Response tone the behavioral adaptor styles replies with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Casual,
    Formal,
    Enthusiastic,
    Analytical,
}

/// Per-genre taste entry
///
/// Invariants: `weight` and `confidence` stay within [0, 1]; `interactions`
/// only grows. Mutated exclusively through the taste service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TasteVector {
    pub weight: f64,
    pub confidence: f64,
    pub last_updated: DateTime<Utc>,
    pub interactions: u32,
}

impl TasteVector {
    /// Starting entry for a genre the user has never interacted with
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self {
            weight: 0.5,
            confidence: 0.1,
            last_updated: now,
            interactions: 0,
        }
    }

    /// Combined ranking score used by top-genre selection
    pub fn affinity(&self) -> f64 {
        self.weight * self.confidence
    }
}

/// Static learning configuration, read-only to the recommendation core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningParams {
    pub decay_rate: f64,
    pub learning_rate: f64,
    pub exploration_rate: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            decay_rate: 0.95,
            learning_rate: 0.3,
            exploration_rate: 0.2,
        }
    }
}

/// Running statistics about how the user interacts with the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionStats {
    pub total_interactions: u32,
    pub positive_feedback: u32,
    pub negative_feedback: u32,
    pub avg_response_length: f64,
    pub preferred_tone: Tone,
    pub engagement_score: f64,
}

impl Default for InteractionStats {
    fn default() -> Self {
        Self {
            total_interactions: 0,
            positive_feedback: 0,
            negative_feedback: 0,
            avg_response_length: 0.0,
            preferred_tone: Tone::default(),
            engagement_score: 0.5,
        }
    }
}

/// Maximum number of conversation themes retained per user
pub const MAX_RECENT_THEMES: usize = 20;

/// Per-user profile document
///
/// Owns every persistent entity of the recommendation core. The pipeline
/// mutates an in-memory copy; the route layer is responsible for the
/// write-back after the request completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: Uuid,
    /// Genre name -> taste entry, ordered by genre name so ranking ties
    /// resolve deterministically
    #[serde(default)]
    pub taste_vectors: BTreeMap<String, TasteVector>,
    #[serde(default)]
    pub learning_params: LearningParams,
    #[serde(default)]
    pub interaction_stats: InteractionStats,
    /// Anime the user has finished, matched by id during candidate filtering
    #[serde(default)]
    pub completed: Vec<AnimeId>,
    /// Rolling window of extracted conversation themes, newest last
    #[serde(default)]
    pub recent_themes: Vec<String>,
}

impl UserProfile {
    /// Creates a fresh profile with default learning parameters
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            taste_vectors: BTreeMap::new(),
            learning_params: LearningParams::default(),
            interaction_stats: InteractionStats::default(),
            completed: Vec::new(),
            recent_themes: Vec::new(),
        }
    }

    /// Records a finished anime, ignoring duplicates
    pub fn mark_completed(&mut self, id: AnimeId) {
        if !self.completed.contains(&id) {
            self.completed.push(id);
        }
    }

    /// Appends a conversation theme, trimming the window to the newest 20
    pub fn record_theme(&mut self, theme: String) {
        self.recent_themes.push(theme);
        if self.recent_themes.len() > MAX_RECENT_THEMES {
            let excess = self.recent_themes.len() - MAX_RECENT_THEMES;
            self.recent_themes.drain(..excess);
        }
    }

    /// The most recent conversation theme, used as continuation context
    pub fn last_theme(&self) -> Option<&str> {
        self.recent_themes.last().map(String::as_str)
    }
}
