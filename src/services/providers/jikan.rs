/// Jikan (MyAnimeList) REST provider
///
/// Jikan exposes MAL data over plain REST. Genre filtering is by MAL's
/// numeric genre ids, so genre names are translated through a static mapping
/// before the request; unknown names are skipped. Scores come back on a 0-10
/// scale and are normalized to 0-100 during conversion.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Anime, JikanAnime},
    services::providers::AnimeProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const GENRE_CACHE_TTL: u64 = 3600; // 1 hour

/// MAL genre ids for the genre names the taste model works with
const GENRE_IDS: &[(&str, u32)] = &[
    ("Action", 1),
    ("Adventure", 2),
    ("Comedy", 4),
    ("Drama", 8),
    ("Fantasy", 10),
    ("Horror", 14),
    ("Mystery", 7),
    ("Psychological", 40),
    ("Romance", 22),
    ("Sci-Fi", 24),
    ("Slice of Life", 36),
    ("Sports", 30),
    ("Supernatural", 37),
    ("Thriller", 41),
];

#[derive(Debug, Deserialize)]
struct JikanResponse {
    #[serde(default)]
    data: Vec<JikanAnime>,
}

#[derive(Clone)]
pub struct JikanProvider {
    http_client: HttpClient,
    api_url: String,
    cache: Cache,
}

impl JikanProvider {
    pub fn new(cache: Cache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            cache,
        }
    }

    /// Translates a genre name to MAL's numeric id
    fn map_genre_id(genre: &str) -> Option<u32> {
        GENRE_IDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(genre))
            .map(|(_, id)| *id)
    }

    async fn get_anime(&self, query: &[(&str, String)]) -> AppResult<Vec<Anime>> {
        let url = format!("{}/anime", self.api_url);

        let response = self.http_client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Jikan API returned status {}: {}",
                status, body
            )));
        }

        let envelope: JikanResponse = response.json().await?;

        Ok(envelope.data.into_iter().map(Anime::from).collect())
    }
}

#[async_trait::async_trait]
impl AnimeProvider for JikanProvider {
    async fn fetch_by_genres(&self, genres: &[String], count: usize) -> AppResult<Vec<Anime>> {
        let genre_ids: Vec<String> = genres
            .iter()
            .filter_map(|genre| {
                let id = Self::map_genre_id(genre);
                if id.is_none() {
                    tracing::debug!(genre = %genre, "Genre has no MAL id mapping, skipped");
                }
                id.map(|id| id.to_string())
            })
            .collect();

        if genre_ids.is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache,
            CacheKey::GenreFetch(genres.to_vec(), count),
            GENRE_CACHE_TTL,
            async move {
                let anime = self
                    .get_anime(&[
                        ("genres", genre_ids.join(",")),
                        ("limit", count.to_string()),
                        ("order_by", "score".to_string()),
                        ("sort", "desc".to_string()),
                    ])
                    .await?;

                tracing::info!(
                    genres = ?genres,
                    results = anime.len(),
                    provider = "jikan",
                    "Genre fetch completed"
                );

                Ok::<_, AppError>(anime)
            }
        )
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Anime>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search(query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let anime = self
                    .get_anime(&[("q", query.to_string()), ("limit", "20".to_string())])
                    .await?;

                tracing::info!(
                    query = %query,
                    results = anime.len(),
                    provider = "jikan",
                    "Title search completed"
                );

                Ok::<_, AppError>(anime)
            }
        )
    }

    fn name(&self) -> &'static str {
        "jikan"
    }
}
