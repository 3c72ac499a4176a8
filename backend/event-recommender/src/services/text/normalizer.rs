use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// Hardcoded patterns; construction cannot fail at runtime
static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("hardcoded url regex is invalid"));

static MENTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[a-zA-Z0-9_]+").expect("hardcoded mention regex is invalid"));

static HASHTAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[^\s#]+").expect("hardcoded hashtag regex is invalid"));

static PUNCTUATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r##"[!"#$%&'()*+,\-./:;<=>?@\[\\\]^_`{|}~「」『』【】（）]"##)
        .expect("hardcoded punctuation regex is invalid")
});

static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("hardcoded whitespace regex is invalid"));

/// Canonicalize raw post or event text.
///
/// NFKC folds full-width characters to their half-width forms, Latin text is
/// lowercased, URLs, mentions and hashtags are removed, punctuation becomes a
/// space and whitespace runs collapse to a single space.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text: String = raw.nfkc().collect::<String>().to_lowercase();

    let text = URL_REGEX.replace_all(&text, "");
    let text = MENTION_REGEX.replace_all(&text, "");
    let text = HASHTAG_REGEX.replace_all(&text, "");
    let text = PUNCTUATION_REGEX.replace_all(&text, " ");
    let text = WHITESPACE_REGEX.replace_all(&text, " ");

    text.trim().to_string()
}
