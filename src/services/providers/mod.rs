/// Anime metadata provider abstraction
///
/// Pluggable architecture for the external metadata sources (AniList
/// GraphQL, Jikan REST). Each provider implements both candidate fetching by
/// genre and free-text title search, normalizing its raw response shape into
/// [`Anime`] at the boundary.
use crate::{error::AppResult, models::Anime};

pub mod anilist;
pub mod jikan;

pub use anilist::AnilistProvider;
pub use jikan::JikanProvider;

/// Trait for anime metadata providers
///
/// Using the same provider for both operations keeps result ids consistent:
/// candidates fetched by genre and titles found by search carry ids from one
/// id space, so history matching never has to translate between providers.
#[async_trait::async_trait]
pub trait AnimeProvider: Send + Sync {
    /// Fetch up to `count` anime matching any of the given genres,
    /// best-rated first
    async fn fetch_by_genres(&self, genres: &[String], count: usize) -> AppResult<Vec<Anime>>;

    /// Search for anime by title
    async fn search(&self, query: &str) -> AppResult<Vec<Anime>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
