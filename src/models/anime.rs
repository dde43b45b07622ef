use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier for an anime, scoped to the provider that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimeId {
    /// AniList media ID
    Anilist(u64),
    /// MyAnimeList ID (used by Jikan)
    Mal(u64),
}

impl Display for AnimeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimeId::Anilist(id) => write!(f, "al:{}", id),
            AnimeId::Mal(id) => write!(f, "mal:{}", id),
        }
    }
}

/// Normalized anime record returned to the recommendation core and clients
///
/// Provider responses (AniList GraphQL, Jikan REST) are decoded into their raw
/// shapes once at the provider boundary and converted into this record; the
/// rest of the crate never re-checks provider-specific fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anime {
    pub id: AnimeId,
    pub title: String,
    pub genres: Vec<String>,
    /// Community score on a 0-100 scale (Jikan's 0-10 scores are rescaled)
    pub average_score: Option<u32>,
    pub episodes: Option<u32>,
    pub season_year: Option<i32>,
    pub synopsis: Option<String>,
    pub cover_url: Option<String>,
}

// ============================================================================
// AniList GraphQL Types
// ============================================================================

/// Media entry from AniList's `Page.media` GraphQL response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnilistMedia {
    pub id: u64,
    pub title: AnilistTitle,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub average_score: Option<u32>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub season_year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<AnilistCoverImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnilistTitle {
    #[serde(default)]
    pub romaji: Option<String>,
    #[serde(default)]
    pub english: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnilistCoverImage {
    #[serde(default)]
    pub large: Option<String>,
}

impl From<AnilistMedia> for Anime {
    fn from(media: AnilistMedia) -> Self {
        // Prefer the English title when AniList has one
        let title = media
            .title
            .english
            .or(media.title.romaji)
            .unwrap_or_else(|| format!("AniList #{}", media.id));

        Anime {
            id: AnimeId::Anilist(media.id),
            title,
            genres: media.genres,
            average_score: media.average_score,
            episodes: media.episodes,
            season_year: media.season_year,
            synopsis: media.description,
            cover_url: media.cover_image.and_then(|c| c.large),
        }
    }
}

// ============================================================================
// Jikan (MyAnimeList) REST Types
// ============================================================================

/// Anime entry from Jikan's `/anime` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct JikanAnime {
    pub mal_id: u64,
    pub title: String,
    #[serde(default)]
    pub genres: Vec<JikanGenre>,
    /// Jikan scores are 0-10 floats
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub images: Option<JikanImages>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanGenre {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanImages {
    #[serde(default)]
    pub jpg: Option<JikanImageSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<JikanAnime> for Anime {
    fn from(anime: JikanAnime) -> Self {
        // Rescale 0-10 to the normalized 0-100 scale
        let average_score = anime.score.map(|s| (s * 10.0).round() as u32);

        Anime {
            id: AnimeId::Mal(anime.mal_id),
            title: anime.title,
            genres: anime.genres.into_iter().map(|g| g.name).collect(),
            average_score,
            episodes: anime.episodes,
            season_year: anime.year,
            synopsis: anime.synopsis,
            cover_url: anime
                .images
                .and_then(|i| i.jpg)
                .and_then(|j| j.image_url),
        }
    }
}
