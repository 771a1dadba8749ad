//! Text normalization, tokenization, and fuzzy matching utilities.
//!
//! All matching in the NLP engine happens on normalized text: lower-case,
//! accents folded to ASCII, sentence punctuation collapsed to spaces. Digits,
//! the euro sign, and arithmetic operators survive normalization so the
//! price extractors and routing heuristics can still see them.

/// Normalize an utterance for rule matching.
///
/// Lower-cases, strips accents (the French subset that actually occurs in
/// user input), replaces sentence punctuation with spaces, and collapses
/// whitespace runs.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        for lc in c.to_lowercase() {
            out.push(fold_accent(lc));
        }
    }

    let cleaned: String = out
        .chars()
        .map(|c| match c {
            '?' | '!' | ';' | ':' | '"' | '\'' | '(' | ')' | '[' | ']' | '{' | '}' | '&' | '#'
            | '*' | '«' | '»' | '’' => ' ',
            _ => c,
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' => 'i',
        'ô' | 'ö' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        _ => c,
    }
}

/// Split normalized text into word tokens, trimming residual punctuation
/// (commas, periods) from token edges.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '€'))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Classic Levenshtein edit distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Whether two words match with typo tolerance.
///
/// Short words must match exactly; words of five characters or more allow a
/// single edit. This keeps "vendre"/"vendr" matching without letting "job"
/// absorb "bob".
pub fn fuzzy_word_match(word: &str, target: &str) -> bool {
    if target.chars().count() < 5 {
        word == target
    } else {
        levenshtein(word, target) <= 1
    }
}

/// Whether `text` contains `phrase`, word by word, with typo tolerance.
///
/// Multi-word phrases must appear as a contiguous token window. Both inputs
/// are expected to be normalized already.
pub fn fuzzy_contains(text: &str, phrase: &str) -> bool {
    let tokens = tokenize(text);
    let phrase_tokens = tokenize(phrase);
    if phrase_tokens.is_empty() || tokens.len() < phrase_tokens.len() {
        return false;
    }

    tokens
        .windows(phrase_tokens.len())
        .any(|window| {
            window
                .iter()
                .zip(phrase_tokens.iter())
                .all(|(w, p)| fuzzy_word_match(w, p))
        })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Normalization ----

    #[test]
    fn test_normalize_lowercase() {
        assert_eq!(normalize("BONJOUR"), "bonjour");
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize("échangé à côté"), "echange a cote");
    }

    #[test]
    fn test_normalize_collapses_punctuation() {
        assert_eq!(normalize("Bonjour ! Ça va ?"), "bonjour ca va");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  je   veux\tvendre "), "je veux vendre");
    }

    #[test]
    fn test_normalize_keeps_digits_and_euro() {
        assert_eq!(normalize("50 € ou 45,50 euros"), "50 € ou 45,50 euros");
    }

    #[test]
    fn test_normalize_keeps_arithmetic() {
        assert_eq!(normalize("1+1"), "1+1");
    }

    #[test]
    fn test_normalize_ampersand() {
        assert_eq!(normalize("Livres & Cours"), "livres cours");
    }

    #[test]
    fn test_normalize_apostrophe() {
        assert_eq!(normalize("j'échange"), "j echange");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
    }

    // ---- Tokenization ----

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(tokenize("je veux vendre"), vec!["je", "veux", "vendre"]);
    }

    #[test]
    fn test_tokenize_trims_commas() {
        assert_eq!(tokenize("paypal, lydia"), vec!["paypal", "lydia"]);
    }

    #[test]
    fn test_tokenize_keeps_euro() {
        assert_eq!(tokenize("50€"), vec!["50€"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("   ").is_empty());
    }

    // ---- Levenshtein ----

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("vendre", "vendre"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("vendre", "vendr"), 1);
        assert_eq!(levenshtein("vendre", "vandre"), 1);
    }

    #[test]
    fn test_levenshtein_empty_sides() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", ""), 0);
    }

    #[test]
    fn test_levenshtein_unrelated() {
        assert_eq!(levenshtein("chat", "lune"), 4);
    }

    // ---- Fuzzy word match ----

    #[test]
    fn test_fuzzy_word_short_exact_only() {
        assert!(fuzzy_word_match("job", "job"));
        assert!(!fuzzy_word_match("bob", "job"));
    }

    #[test]
    fn test_fuzzy_word_long_one_edit() {
        assert!(fuzzy_word_match("vendre", "vendre"));
        assert!(fuzzy_word_match("vendr", "vendre"));
        assert!(!fuzzy_word_match("vndr", "vendre"));
    }

    // ---- Fuzzy contains ----

    #[test]
    fn test_fuzzy_contains_single_word() {
        assert!(fuzzy_contains("je veux vendre un livre", "vendre"));
    }

    #[test]
    fn test_fuzzy_contains_typo() {
        assert!(fuzzy_contains("je veux vendrr un livre", "vendre"));
    }

    #[test]
    fn test_fuzzy_contains_phrase() {
        assert!(fuzzy_contains("bonjour je cherche un logement", "je cherche"));
    }

    #[test]
    fn test_fuzzy_contains_phrase_not_contiguous() {
        assert!(!fuzzy_contains("je ne cherche pas", "je cherche"));
    }

    #[test]
    fn test_fuzzy_contains_absent() {
        assert!(!fuzzy_contains("bonjour tout le monde", "vendre"));
    }

    #[test]
    fn test_fuzzy_contains_empty_phrase() {
        assert!(!fuzzy_contains("bonjour", ""));
    }

    #[test]
    fn test_fuzzy_contains_text_shorter_than_phrase() {
        assert!(!fuzzy_contains("je", "je veux vendre"));
    }
}
