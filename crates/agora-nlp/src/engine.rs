//! Intent classification over a static rule table.
//!
//! Rules are evaluated in declaration order and the first match wins, which
//! makes classification deterministic for utterances that mention several
//! topics ("bonjour je veux vendre" is a listing, not a greeting). An
//! utterance matching no rule falls back to the unknown intent with a low,
//! configurable confidence so the router can hand it to the LLM.

use tracing::debug;

use agora_core::{Intent, NlpResult, Sentiment};

use crate::entities::extract_entities;
use crate::text::{fuzzy_contains, normalize};

/// One classification rule: an intent, the confidence it reports, and the
/// phrases that trigger it (matched with typo tolerance).
struct IntentRule {
    intent: Intent,
    confidence: f32,
    phrases: &'static [&'static str],
}

/// Priority-ordered rule table. Transaction verbs come first so that a
/// listing request wins over the greeting or search wording around it.
static RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::CreateListing,
        confidence: 0.9,
        phrases: &[
            "vendre",
            "je vends",
            "a vendre",
            "mettre en vente",
            "donner",
            "je donne",
            "a donner",
            "echanger",
            "j echange",
            "troquer",
            "je troque",
            "proposer un service",
            "je propose",
            "poster une annonce",
            "creer une annonce",
            "publier une annonce",
            "sell",
        ],
    },
    IntentRule {
        intent: Intent::Housing,
        confidence: 0.85,
        phrases: &[
            "logement",
            "colocation",
            "coloc",
            "appartement",
            "studio",
            "chambre a louer",
            "housing",
        ],
    },
    IntentRule {
        intent: Intent::Jobs,
        confidence: 0.85,
        phrases: &[
            "job etudiant",
            "petit boulot",
            "emploi",
            "stage",
            "alternance",
            "babysitting",
            "job",
        ],
    },
    IntentRule {
        intent: Intent::PricingQuestion,
        confidence: 0.8,
        phrases: &[
            "quel prix",
            "a quel prix",
            "combien",
            "estimer le prix",
            "prix conseille",
            "quelle valeur",
        ],
    },
    IntentRule {
        intent: Intent::SafetyQuestion,
        confidence: 0.8,
        phrases: &[
            "arnaque",
            "securite",
            "securise",
            "fiable",
            "confiance",
            "scam",
            "danger",
        ],
    },
    IntentRule {
        intent: Intent::ViewMessages,
        confidence: 0.9,
        phrases: &["mes messages", "messagerie", "boite de reception", "messages"],
    },
    IntentRule {
        intent: Intent::ViewFavorites,
        confidence: 0.9,
        phrases: &["mes favoris", "favoris", "wishlist", "favorites"],
    },
    IntentRule {
        intent: Intent::SearchItem,
        confidence: 0.85,
        phrases: &[
            "je cherche",
            "cherche",
            "recherche",
            "acheter",
            "trouver",
            "looking for",
            "search",
        ],
    },
    IntentRule {
        intent: Intent::Greeting,
        confidence: 0.95,
        phrases: &["bonjour", "salut", "bonsoir", "coucou", "hello", "hey", "yo"],
    },
    IntentRule {
        intent: Intent::Thanks,
        confidence: 0.95,
        phrases: &["merci", "thanks", "thank you"],
    },
];

static POSITIVE_WORDS: &[&str] = &[
    "merci", "super", "genial", "parfait", "top", "cool", "excellent", "nickel",
];

static NEGATIVE_WORDS: &[&str] = &[
    "nul", "arnaque", "probleme", "decu", "decue", "mauvais", "horrible", "inadmissible",
];

/// Rule-based intent classifier and entity extractor.
///
/// Stateless apart from the configured fallback confidence; the same input
/// always yields the same result.
pub struct NlpEngine {
    unknown_confidence: f32,
}

impl NlpEngine {
    pub fn new(unknown_confidence: f32) -> Self {
        Self { unknown_confidence }
    }

    /// Classify an utterance. Never fails: no matching rule yields the
    /// unknown intent at the fallback confidence.
    pub fn classify(&self, input: &str) -> NlpResult {
        let normalized = normalize(input);

        let (intent, confidence) = RULES
            .iter()
            .find(|rule| rule.phrases.iter().any(|p| fuzzy_contains(&normalized, p)))
            .map(|rule| (rule.intent, rule.confidence))
            .unwrap_or((Intent::Unknown, self.unknown_confidence));

        let entities = extract_entities(&normalized);
        let sentiment = detect_sentiment(&normalized);

        debug!(
            %intent,
            confidence,
            entity_count = entities.len(),
            "classified utterance"
        );

        NlpResult {
            intent,
            confidence,
            entities,
            sentiment,
        }
    }
}

impl Default for NlpEngine {
    fn default() -> Self {
        Self::new(0.3)
    }
}

/// Keyword-count sentiment: more negative than positive hits reads negative,
/// the reverse positive, everything else neutral.
fn detect_sentiment(normalized: &str) -> Sentiment {
    let positive = POSITIVE_WORDS
        .iter()
        .filter(|w| fuzzy_contains(normalized, w))
        .count();
    let negative = NEGATIVE_WORDS
        .iter()
        .filter(|w| fuzzy_contains(normalized, w))
        .count();

    if negative > positive {
        Sentiment::Negative
    } else if positive > negative {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

// =============================================================================
// Tests
// =============================================================================
