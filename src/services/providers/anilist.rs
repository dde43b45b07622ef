/// AniList GraphQL provider
///
/// Queries AniList's public GraphQL endpoint (`Page.media`) for genre-matched
/// candidates and title search. AniList scores are already on the normalized
/// 0-100 scale; only the response envelope needs unwrapping.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{AnilistMedia, Anime},
    services::providers::AnimeProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const GENRE_CACHE_TTL: u64 = 3600; // 1 hour

const GENRE_QUERY: &str = r#"
query ($genres: [String], $perPage: Int) {
  Page(perPage: $perPage) {
    media(genre_in: $genres, type: ANIME, sort: SCORE_DESC) {
      id
      title { romaji english }
      genres
      averageScore
      episodes
      seasonYear
      description
      coverImage { large }
    }
  }
}"#;

const SEARCH_QUERY: &str = r#"
query ($search: String, $perPage: Int) {
  Page(perPage: $perPage) {
    media(search: $search, type: ANIME) {
      id
      title { romaji english }
      genres
      averageScore
      episodes
      seasonYear
      description
      coverImage { large }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    #[serde(rename = "Page")]
    page: GraphQlPage,
}

#[derive(Debug, Deserialize)]
struct GraphQlPage {
    #[serde(default)]
    media: Vec<AnilistMedia>,
}

#[derive(Clone)]
pub struct AnilistProvider {
    http_client: HttpClient,
    api_url: String,
    cache: Cache,
}

impl AnilistProvider {
    pub fn new(cache: Cache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            cache,
        }
    }

    /// Posts a GraphQL query and unwraps the `Page.media` envelope
    async fn run_query(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> AppResult<Vec<Anime>> {
        let response = self
            .http_client
            .post(&self.api_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "AniList API returned status {}: {}",
                status, body
            )));
        }

        let envelope: GraphQlResponse = response.json().await?;

        if let Some(errors) = envelope.errors {
            if !errors.is_empty() {
                return Err(AppError::ExternalApi(format!(
                    "AniList GraphQL errors: {}",
                    serde_json::to_string(&errors).unwrap_or_default()
                )));
            }
        }

        let media = envelope
            .data
            .ok_or_else(|| AppError::ExternalApi("AniList response missing data".to_string()))?
            .page
            .media;

        Ok(media.into_iter().map(Anime::from).collect())
    }
}

#[async_trait::async_trait]
impl AnimeProvider for AnilistProvider {
    async fn fetch_by_genres(&self, genres: &[String], count: usize) -> AppResult<Vec<Anime>> {
        if genres.is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache,
            CacheKey::GenreFetch(genres.to_vec(), count),
            GENRE_CACHE_TTL,
            async move {
                let anime = self
                    .run_query(
                        GENRE_QUERY,
                        json!({ "genres": genres, "perPage": count }),
                    )
                    .await?;

                tracing::info!(
                    genres = ?genres,
                    results = anime.len(),
                    provider = "anilist",
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
                    .run_query(SEARCH_QUERY, json!({ "search": query, "perPage": 20 }))
                    .await?;

                tracing::info!(
                    query = %query,
                    results = anime.len(),
                    provider = "anilist",
                    "Title search completed"
                );

                Ok::<_, AppError>(anime)
            }
        )
    }

    fn name(&self) -> &'static str {
        "anilist"
    }
}
