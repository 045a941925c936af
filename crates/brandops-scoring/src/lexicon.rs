//! Lexicon sentiment scorer and tokenizer for social brand conversations.

/// Word weights for audience sentiment.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("love", 0.5),
    ("loved", 0.5),
    ("loving", 0.4),
    ("amazing", 0.5),
    ("awesome", 0.5),
    ("great", 0.4),
    ("good", 0.3),
    ("excellent", 0.5),
    ("best", 0.5),
    ("thanks", 0.3),
    ("thank", 0.3),
    ("happy", 0.4),
    ("recommend", 0.4),
    ("favorite", 0.4),
    ("delicious", 0.4),
    ("fast", 0.2),
    ("helpful", 0.4),
    ("perfect", 0.5),
    ("beautiful", 0.4),
    ("excited", 0.4),
    // Negative signals
    ("hate", -0.6),
    ("terrible", -0.6),
    ("awful", -0.6),
    ("worst", -0.6),
    ("bad", -0.4),
    ("broken", -0.5),
    ("refund", -0.4),
    ("scam", -0.7),
    ("disappointed", -0.5),
    ("disappointing", -0.5),
    ("angry", -0.5),
    ("rude", -0.5),
    ("slow", -0.3),
    ("late", -0.3),
    ("never", -0.2),
    ("problem", -0.3),
    ("issue", -0.3),
    ("complaint", -0.4),
    ("unacceptable", -0.6),
    ("cancel", -0.4),
];

/// Splits text into lowercase alphanumeric words, dropping punctuation,
/// hashtag and mention markers.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Score a text string using the lexicon.
///
/// Sums the weights of matching words and clamps to `[-1.0, 1.0]`.
/// Returns `0.0` for empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f64 {
    let score: f64 = tokenize(text)
        .iter()
        .filter_map(|word| {
            LEXICON
                .iter()
                .find(|(lex_word, _)| lex_word == word)
                .map(|&(_, weight)| weight)
        })
        .sum();
    score.clamp(-1.0, 1.0)
}

/// Coarse sentiment bucket for a lexicon score.
#[must_use]
pub fn sentiment_label(score: f64) -> &'static str {
    if score > 0.1 {
        "positive"
    } else if score < -0.1 {
        "negative"
    } else {
        "neutral"
    }
}

/// True when most letters are uppercase and there are enough of them to
/// read as shouting.
#[must_use]
pub fn is_shouting(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 8 {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper * 10 >= letters.len() * 7
}

/// Case-insensitive substring test.
#[must_use]
pub fn contains_phrase(haystack_lower: &str, phrase: &str) -> bool {
    let phrase = phrase.trim();
    !phrase.is_empty() && haystack_lower.contains(&phrase.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_returns_zero() {
        assert_eq!(lexicon_score(""), 0.0);
    }

    #[test]
    fn unknown_text_returns_zero() {
        assert_eq!(lexicon_score("the quick brown fox"), 0.0);
    }

    #[test]
    fn positive_keyword_returns_positive() {
        let score = lexicon_score("this flavor is amazing");
        assert!(score > 0.0, "expected positive score, got {score}");
    }

    #[test]
    fn negative_keyword_returns_negative() {
        let score = lexicon_score("my order arrived broken");
        assert!(score < 0.0, "expected negative score, got {score}");
    }

    #[test]
    fn score_clamps_to_bounds() {
        assert_eq!(
            lexicon_score("love amazing awesome best perfect excellent"),
            1.0
        );
        assert_eq!(
            lexicon_score("hate terrible awful worst scam unacceptable"),
            -1.0
        );
    }

    #[test]
    fn punctuation_and_markers_are_stripped() {
        assert_eq!(tokenize("Love it!! #Summer @brand"), vec!["love", "it", "summer", "brand"]);
        assert!(lexicon_score("great!") > 0.0);
    }

    #[test]
    fn labels_follow_score() {
        assert_eq!(sentiment_label(0.5), "positive");
        assert_eq!(sentiment_label(-0.5), "negative");
        assert_eq!(sentiment_label(0.05), "neutral");
    }

    #[test]
    fn shouting_needs_enough_letters() {
        assert!(is_shouting("THIS IS UNACCEPTABLE"));
        assert!(!is_shouting("OK"));
        assert!(!is_shouting("This is fine"));
    }
}
