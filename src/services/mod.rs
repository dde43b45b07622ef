pub mod adaptor;
pub mod intent;
pub mod providers;
pub mod recommender;
pub mod taste;

pub use intent::{Classification, Intent, IntentClassifier};
pub use providers::AnimeProvider;
pub use recommender::{AdaptiveRecommender, RecommendationSet, ScoredAnime};
