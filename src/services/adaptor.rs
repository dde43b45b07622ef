//! Behavioral adaptation: styles generated replies to the user's observed
//! preferences and folds each interaction back into the profile's stats.
//!
//! `adapt_response_style` is meant to run exactly once per generated reply;
//! the transforms are not idempotent and re-applying them to an already
//! adapted string can double-substitute.

use rand::Rng;

use crate::models::{Feedback, Tone, UserProfile};
use crate::services::taste;

/// EMA factor: how much of the old average survives each interaction
const LENGTH_EMA_RETAIN: f64 = 0.9;

/// Replies longer than this multiple of the user's average get shortened
const LENGTH_TRUNCATE_FACTOR: f64 = 1.5;

/// Engagement above this earns an enthusiasm prefix
const HIGH_ENGAGEMENT: f64 = 0.7;

/// Engagement below this trims the reply to its first sentence
const LOW_ENGAGEMENT: f64 = 0.3;

/// Top-genre weight above which replies get a personalization prefix
const PERSONALIZATION_WEIGHT: f64 = 0.7;

/// Marker-word count needed to infer the enthusiastic or formal tone
const TONE_MARKER_THRESHOLD: usize = 2;

/// Per-tone substitution tables, applied in order
const CASUAL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("cannot", "can't"),
    ("do not", "don't"),
    ("However", "But"),
    ("very enjoyable", "a lot of fun"),
];

const FORMAL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("can't", "cannot"),
    ("don't", "do not"),
    ("gonna", "going to"),
    ("yeah", "yes"),
];

const ENTHUSIASTIC_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("good", "amazing"),
    ("nice", "fantastic"),
    ("enjoyable", "an absolute blast"),
];

const ANALYTICAL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("I think", "Based on your history"),
    ("great", "consistently highly rated"),
];

const ENTHUSIASTIC_MARKERS: &[&str] = &["!", "awesome", "amazing", "love", "hyped", "best"];
const FORMAL_MARKERS: &[&str] = &["please", "would you", "could you", "kindly", "thank you"];
const CASUAL_MARKERS: &[&str] = &["lol", "haha", "btw", "tbh", "yeah", "gonna"];

/// Personalization prefixes; `{genre}` is replaced with the user's top genre
const PERSONALIZATION_PREFIXES: &[&str] = &[
    "As a fellow {genre} fan, ",
    "Since you're into {genre}, ",
    "Knowing your taste for {genre}, ",
];

/// Conversation theme buckets, matched by keyword; first hit wins
const THEME_TABLE: &[(&str, &[&str])] = &[
    ("recommendations", &["recommend", "suggest", "what to watch"]),
    ("discovery", &["discover", "hidden gem", "something new"]),
    ("mood", &["feeling", "mood", "sad", "happy", "tired", "bored"]),
    ("comparison", &["compare", "versus", "better than"]),
    ("genres", &["action", "romance", "comedy", "drama", "fantasy"]),
];

const DEFAULT_THEME: &str = "general";

/// Styles a generated reply to the user's preferences
///
/// Transforms run in a fixed order: tone substitution, length adjustment,
/// enthusiasm injection, personalization prefix. Apply once per reply.
pub fn adapt_response_style<R: Rng>(text: &str, profile: &UserProfile, rng: &mut R) -> String {
    let stats = &profile.interaction_stats;

    let mut adapted = apply_tone(text, stats.preferred_tone);
    adapted = adjust_length(&adapted, stats.avg_response_length);
    adapted = inject_enthusiasm(&adapted, stats.engagement_score);

    if let Some((genre, weight)) = taste::top_genres(profile, 1).into_iter().next() {
        if weight > PERSONALIZATION_WEIGHT {
            let prefix = PERSONALIZATION_PREFIXES[rng.gen_range(0..PERSONALIZATION_PREFIXES.len())]
                .replace("{genre}", &genre);
            adapted = format!("{}{}", prefix, adapted);
        }
    }

    adapted
}

fn apply_tone(text: &str, tone: Tone) -> String {
    let table = match tone {
        Tone::Casual => CASUAL_SUBSTITUTIONS,
        Tone::Formal => FORMAL_SUBSTITUTIONS,
        Tone::Enthusiastic => ENTHUSIASTIC_SUBSTITUTIONS,
        Tone::Analytical => ANALYTICAL_SUBSTITUTIONS,
    };

    let mut adapted = text.to_string();
    for (from, to) in table {
        adapted = adapted.replace(from, to);
    }
    adapted
}

/// Shortens replies that run well past the user's average length
///
/// Cuts at a sentence boundary under the target; never pads short replies.
fn adjust_length(text: &str, avg_length: f64) -> String {
    if avg_length <= 0.0 {
        return text.to_string();
    }

    let target = (avg_length * LENGTH_TRUNCATE_FACTOR) as usize;
    if text.len() <= target {
        return text.to_string();
    }

    let mut kept = String::new();
    for sentence in text.split_inclusive(". ") {
        if !kept.is_empty() && kept.len() + sentence.len() > target {
            break;
        }
        kept.push_str(sentence);
    }

    if kept.is_empty() {
        text.to_string()
    } else {
        kept.trim_end().to_string()
    }
}

fn inject_enthusiasm(text: &str, engagement: f64) -> String {
    if engagement > HIGH_ENGAGEMENT {
        format!("✨ {}", text)
    } else if engagement < LOW_ENGAGEMENT {
        first_sentence(text)
    } else {
        text.to_string()
    }
}

fn first_sentence(text: &str) -> String {
    match text.find(". ") {
        Some(idx) => text[..=idx].to_string(),
        None => text.to_string(),
    }
}

/// Folds one chat interaction into the profile's stats and themes
pub fn update_from_interaction(
    profile: &mut UserProfile,
    user_message: &str,
    reply: &str,
    feedback: Option<Feedback>,
) {
    let stats = &mut profile.interaction_stats;

    stats.total_interactions += 1;
    match feedback {
        Some(Feedback::Positive) => stats.positive_feedback += 1,
        Some(Feedback::Negative) => stats.negative_feedback += 1,
        None => {}
    }

    let reply_length = reply.len() as f64;
    if stats.total_interactions == 1 {
        stats.avg_response_length = reply_length;
    } else {
        stats.avg_response_length = LENGTH_EMA_RETAIN * stats.avg_response_length
            + (1.0 - LENGTH_EMA_RETAIN) * reply_length;
    }

    // Feedback ratio blended with an interaction-count ramp that saturates
    // at ten interactions
    let total = stats.total_interactions as f64;
    let positive = stats.positive_feedback as f64;
    stats.engagement_score = (positive / total.max(1.0)) * 0.7 + (total.min(10.0) / 10.0) * 0.3;

    stats.preferred_tone = infer_tone(user_message).unwrap_or(stats.preferred_tone);

    let theme = extract_theme(user_message);
    profile.record_theme(theme.to_string());

    tracing::debug!(
        user_id = %profile.user_id,
        engagement = profile.interaction_stats.engagement_score,
        tone = ?profile.interaction_stats.preferred_tone,
        theme = %theme,
        "Interaction stats updated"
    );
}

/// Infers the user's tone from marker words, or `None` to keep the current
/// one. Priority on simultaneous hits: enthusiastic, then formal, then casual.
fn infer_tone(message: &str) -> Option<Tone> {
    let lowered = message.to_lowercase();

    let count = |markers: &[&str]| -> usize {
        markers
            .iter()
            .map(|marker| lowered.matches(marker).count())
            .sum()
    };

    if count(ENTHUSIASTIC_MARKERS) >= TONE_MARKER_THRESHOLD {
        Some(Tone::Enthusiastic)
    } else if count(FORMAL_MARKERS) >= TONE_MARKER_THRESHOLD {
        Some(Tone::Formal)
    } else if count(CASUAL_MARKERS) >= 1 {
        Some(Tone::Casual)
    } else {
        None
    }
}

/// Buckets a message into a conversation theme by keyword match
fn extract_theme(message: &str) -> &'static str {
    let lowered = message.to_lowercase();

    for (theme, keywords) in THEME_TABLE {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return theme;
        }
    }

    DEFAULT_THEME
}
