use regex::Regex;
use serde::{Deserialize, Serialize};

/// Chat intents the classifier can resolve a message to
///
/// Declaration order is the explicit tie-break priority: when two intents
/// accumulate the same confidence, the earlier one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Recommendation,
    Discovery,
    MoodBased,
    Comparison,
    Chat,
}

impl Intent {
    /// Maps a stored conversation theme back to the intent it continues
    pub fn from_theme(theme: &str) -> Option<Intent> {
        match theme {
            "recommendations" => Some(Intent::Recommendation),
            "discovery" => Some(Intent::Discovery),
            "mood" => Some(Intent::MoodBased),
            "comparison" => Some(Intent::Comparison),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Recommendation => write!(f, "recommendation"),
            Intent::Discovery => write!(f, "discovery"),
            Intent::MoodBased => write!(f, "mood_based"),
            Intent::Comparison => write!(f, "comparison"),
            Intent::Chat => write!(f, "chat"),
        }
    }
}

/// Result of classifying one message
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub intent: Intent,
    /// Accumulated confidence, capped at 1.0
    pub confidence: f64,
    /// Which keywords/patterns contributed to the score
    pub triggered_by: Vec<String>,
}

const KEYWORD_SCORE: f64 = 0.2;
const PATTERN_SCORE: f64 = 0.3;
const CONTINUATION_BONUS: f64 = 0.1;

/// One intent's scoring table: keyword substrings, compiled regex patterns,
/// and the acceptance threshold
struct IntentRule {
    intent: Intent,
    keywords: &'static [&'static str],
    patterns: Vec<Regex>,
    threshold: f64,
}

/// Rule-based intent classifier over keyword and regex tables
///
/// Pure function of the message and continuation context; always produces a
/// result. Messages that clear no intent's threshold fall back to `chat`.
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Builds the classifier, compiling all pattern tables once
    pub fn new() -> Self {
        let rules = vec![
            IntentRule {
                intent: Intent::Recommendation,
                keywords: &[
                    "recommend",
                    "recommend me",
                    "suggest",
                    "suggestion",
                    "what to watch",
                    "worth watching",
                    "any good anime",
                ],
                patterns: compile(&[
                    r"(?i)recommend\s+me",
                    r"(?i)what\s+should\s+i\s+watch",
                    r"(?i)suggest\s+(me\s+)?(some|an?\b)",
                    r"(?i)give\s+me\s+(something|an?\s+anime)",
                ]),
                threshold: 0.7,
            },
            IntentRule {
                intent: Intent::Discovery,
                keywords: &[
                    "discover",
                    "new anime",
                    "hidden gem",
                    "underrated",
                    "explore",
                    "never seen",
                ],
                patterns: compile(&[
                    r"(?i)something\s+(new|different)",
                    r"(?i)hidden\s+gems?",
                    r"(?i)never\s+heard\s+of",
                ]),
                threshold: 0.6,
            },
            IntentRule {
                intent: Intent::MoodBased,
                keywords: &[
                    "feeling",
                    "mood",
                    "sad",
                    "happy",
                    "excited",
                    "tired",
                    "bored",
                ],
                patterns: compile(&[
                    r"(?i)i'?m\s+feeling",
                    r"(?i)in\s+the\s+mood",
                    r"(?i)cheer\s+me\s+up",
                ]),
                threshold: 0.5,
            },
            IntentRule {
                intent: Intent::Comparison,
                keywords: &[
                    "compare",
                    "versus",
                    "better than",
                    "similar to",
                    "difference between",
                ],
                patterns: compile(&[
                    r"(?i)\bvs\.?\b",
                    r"(?i)(anime|show)s?\s+like\b",
                    r"(?i)better\s+than",
                ]),
                threshold: 0.6,
            },
            // chat has threshold 0 and only wins when it is the sole
            // non-zero candidate; otherwise it arrives via the fallback
            IntentRule {
                intent: Intent::Chat,
                keywords: &["hello", "hi there", "thanks", "thank you", "how are you"],
                patterns: Vec::new(),
                threshold: 0.0,
            },
        ];

        Self { rules }
    }

    /// Classifies a message, optionally biased toward the previous intent
    pub fn classify(&self, message: &str, last_intent: Option<Intent>) -> Classification {
        let lowered = message.to_lowercase();

        let mut candidates: Vec<Classification> = Vec::new();

        for rule in &self.rules {
            let mut confidence = 0.0;
            let mut triggered_by = Vec::new();

            for keyword in rule.keywords {
                if lowered.contains(keyword) {
                    confidence += KEYWORD_SCORE;
                    triggered_by.push(format!("keyword:{}", keyword));
                }
            }

            for pattern in &rule.patterns {
                if pattern.is_match(message) {
                    confidence += PATTERN_SCORE;
                    triggered_by.push(format!("pattern:{}", pattern.as_str()));
                }
            }

            if last_intent == Some(rule.intent) && confidence > 0.0 {
                confidence += CONTINUATION_BONUS;
                triggered_by.push("continuation".to_string());
            }

            if confidence > 0.0 {
                candidates.push(Classification {
                    intent: rule.intent,
                    confidence: confidence.min(1.0),
                    triggered_by,
                });
            }
        }

        // Stable sort keeps declaration order on equal confidence
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        match candidates.into_iter().next() {
            Some(top) if top.confidence >= self.threshold_for(top.intent) => top,
            _ => Classification {
                intent: Intent::Chat,
                confidence: 1.0,
                triggered_by: vec!["default_fallback".to_string()],
            },
        }
    }

    fn threshold_for(&self, intent: Intent) -> f64 {
        self.rules
            .iter()
            .find(|r| r.intent == intent)
            .map(|r| r.threshold)
            .unwrap_or(0.0)
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static intent pattern must compile"))
        .collect()
}
