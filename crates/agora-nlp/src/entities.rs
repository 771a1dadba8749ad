//! Per-entity-type extractors.
//!
//! Every extractor runs unconditionally on the normalized utterance,
//! independent of the classified intent, and contributes whatever it finds.
//! Numeric patterns are regexes compiled once; category, condition, and
//! payment detection are keyword maps.

use std::sync::LazyLock;

use regex::Regex;

use agora_core::{Entity, EntityKind};

// =============================================================================
// Compiled patterns (on normalized text: lower-case, accents folded)
// =============================================================================

static HOURLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d{1,2})?)\s*(?:€|euros?\b|eur\b)\s*(?:/|par\s+)\s*h(?:eure)?\b")
        .expect("Invalid hourly rate regex")
});

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d{1,2})?)\s*(?:€|euros?\b|eur\b)").expect("Invalid price regex")
});

static ESTIMATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:valeur|estimee?|vaut)\s+(?:de\s+|a\s+|environ\s+)?(\d+(?:[.,]\d{1,2})?)")
        .expect("Invalid estimate regex")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(heures?|jours?|semaines?|mois|ans?)\b").expect("Invalid duration regex")
});

// Product name: free text after a transaction verb, stopping before a
// preposition tail or a number (which is usually the price).
static PRODUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:vendre|vends|donner|donne|echanger|echange|troquer|troque|proposer|propose)\s+(?:un\s+|une\s+|des\s+|mon\s+|ma\s+|mes\s+|le\s+|la\s+|les\s+|l\s+)?(.+?)(?:\s+(?:pour|contre|a|au|aux|en|parce|car)\b.*|\s+\d.*)?$",
    )
    .expect("Invalid product name regex")
});

static DESIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"contre\s+(.+)$").expect("Invalid desired items regex"));

static SKILLS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:competences?|je sais faire|je maitrise)\s+(?:en\s+)?(.+)$")
        .expect("Invalid skills regex")
});

static DONATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:parce que?\s+|car\s+|puisque\s+)(.+)$").expect("Invalid donation regex")
});

// =============================================================================
// Keyword maps
// =============================================================================

/// Category labels with their trigger keywords, in priority order.
static CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Livres & Cours",
        &["livre", "livres", "manuel", "manuels", "bd", "roman", "cours", "polycopie"],
    ),
    (
        "Électronique",
        &[
            "ordinateur", "pc", "telephone", "iphone", "tablette", "casque", "ecouteurs",
            "console", "imprimante", "electronique", "chargeur",
        ],
    ),
    (
        "Meubles",
        &["meuble", "meubles", "bureau", "chaise", "table", "etagere", "canape", "lit", "armoire"],
    ),
    (
        "Vêtements",
        &["vetement", "vetements", "pull", "manteau", "jean", "robe", "chaussures", "veste"],
    ),
    (
        "Sport & Loisirs",
        &["velo", "raquette", "ballon", "guitare", "skate", "rollers", "sport"],
    ),
    (
        "Électroménager",
        &["frigo", "refrigerateur", "micro-ondes", "bouilloire", "cafetiere", "aspirateur"],
    ),
];

/// Condition labels, most specific first ("comme neuf" before "neuf").
static CONDITIONS: &[(&str, &[&str])] = &[
    ("comme neuf", &["comme neuf", "quasi neuf", "excellent etat"]),
    ("neuf", &["neuf", "neuve", "jamais servi", "jamais utilise"]),
    ("bon état", &["tres bon etat", "bon etat"]),
    ("état correct", &["etat correct", "quelques traces"]),
    ("usé", &["use", "usee", "abime", "abimee", "mauvais etat"]),
];

/// Payment method labels; all matches are collected.
static PAYMENT_METHODS: &[(&str, &[&str])] = &[
    ("espèces", &["especes", "cash", "liquide"]),
    ("virement", &["virement"]),
    ("paypal", &["paypal"]),
    ("lydia", &["lydia"]),
    ("carte bancaire", &["carte", "cb"]),
];

// =============================================================================
// Extraction
// =============================================================================

/// Run every extractor on a normalized utterance.
///
/// Entities of different kinds may co-occur; at most one entity per kind is
/// produced. Extraction never fails: no match simply contributes nothing.
pub fn extract_entities(normalized: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    if let Some(caps) = PRODUCT_RE.captures(normalized) {
        if let Some(m) = caps.get(1) {
            let value = m.as_str().trim();
            if !value.is_empty() {
                entities.push(Entity::new(
                    EntityKind::ProductName,
                    value,
                    (m.start(), m.end()),
                ));
            }
        }
    }

    if let Some((label, span)) = first_keyword_match(normalized, CATEGORIES) {
        entities.push(Entity::new(EntityKind::Category, label, span));
    }

    // Hourly rates shadow plain prices on the same span ("15 €/h" is a rate,
    // not a price).
    let hourly_span = HOURLY_RE.captures(normalized).map(|caps| {
        let m = caps.get(0).expect("group 0 always present");
        let value = caps.get(1).expect("rate group").as_str().replace(',', ".");
        entities.push(Entity::new(EntityKind::HourlyRate, value, (m.start(), m.end())));
        (m.start(), m.end())
    });

    if let Some(caps) = PRICE_RE.captures(normalized) {
        let m = caps.get(0).expect("group 0 always present");
        let inside_hourly =
            hourly_span.is_some_and(|(start, end)| m.start() >= start && m.start() < end);
        if !inside_hourly {
            let value = caps.get(1).expect("price group").as_str().replace(',', ".");
            entities.push(Entity::new(EntityKind::Price, value, (m.start(), m.end())));
        }
    }

    if let Some(caps) = ESTIMATE_RE.captures(normalized) {
        let m = caps.get(1).expect("estimate group");
        entities.push(Entity::new(
            EntityKind::EstimatedValue,
            m.as_str().replace(',', "."),
            (m.start(), m.end()),
        ));
    }

    if let Some((label, span)) = first_keyword_match(normalized, CONDITIONS) {
        entities.push(Entity::new(EntityKind::Condition, label, span));
    }

    let mut methods = Vec::new();
    let mut methods_span = None;
    for (label, keywords) in PAYMENT_METHODS {
        if let Some(span) = keywords.iter().find_map(|k| find_token(normalized, k)) {
            methods.push(*label);
            methods_span.get_or_insert(span);
        }
    }
    if let Some(span) = methods_span {
        entities.push(Entity::new(
            EntityKind::PaymentMethods,
            methods.join(", "),
            span,
        ));
    }

    if let Some(caps) = DURATION_RE.captures(normalized) {
        let m = caps.get(0).expect("group 0 always present");
        entities.push(Entity::new(
            EntityKind::Duration,
            m.as_str(),
            (m.start(), m.end()),
        ));
    }

    if let Some(caps) = DESIRED_RE.captures(normalized) {
        let m = caps.get(1).expect("desired group");
        entities.push(Entity::new(
            EntityKind::DesiredItems,
            m.as_str().trim(),
            (m.start(), m.end()),
        ));
    }

    if let Some(caps) = SKILLS_RE.captures(normalized) {
        let m = caps.get(1).expect("skills group");
        entities.push(Entity::new(
            EntityKind::Skills,
            m.as_str().trim(),
            (m.start(), m.end()),
        ));
    }

    if let Some(caps) = DONATION_RE.captures(normalized) {
        let m = caps.get(1).expect("donation group");
        entities.push(Entity::new(
            EntityKind::DonationReason,
            m.as_str().trim(),
            (m.start(), m.end()),
        ));
    }

    entities
}

/// First label whose keyword appears as a whole token sequence in the text.
fn first_keyword_match(
    text: &str,
    table: &[(&'static str, &[&str])],
) -> Option<(&'static str, (usize, usize))> {
    for (label, keywords) in table {
        for keyword in *keywords {
            if let Some(span) = find_token(text, keyword) {
                return Some((label, span));
            }
        }
    }
    None
}

/// Find `word` in `text` at token boundaries, returning its byte span.
fn find_token(text: &str, word: &str) -> Option<(usize, usize)> {
    for (start, matched) in text.match_indices(word) {
        let end = start + matched.len();
        let boundary_before = start == 0
            || !text[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let boundary_after = end == text.len()
            || !text[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
        if boundary_before && boundary_after {
            return Some((start, end));
        }
    }
    None
}

// =============================================================================
// Tests
// =============================================================================
