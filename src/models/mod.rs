mod anime;
mod profile;

pub use anime::{
    AnilistCoverImage, AnilistMedia, AnilistTitle, Anime, AnimeId, JikanAnime, JikanGenre,
    JikanImageSet, JikanImages,
};
pub use profile::{
    Action, Feedback, InteractionStats, LearningParams, TasteVector, Tone, UserProfile,
    MAX_RECENT_THEMES,
};
