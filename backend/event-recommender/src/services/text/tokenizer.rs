use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use super::analyzer::{MorphologicalAnalyzer, PosTag, ScriptRunAnalyzer};
use super::stopwords::Stopwords;

/// Longest run of digits kept as a token; longer ones are ids or phone numbers
const MAX_NUMERIC_TOKEN_LEN: usize = 4;

/// Turns normalized text into a bag of content words.
#[derive(Clone)]
pub struct Tokenizer {
    analyzer: Option<Arc<dyn MorphologicalAnalyzer>>,
    allowed_pos: HashSet<PosTag>,
    stopwords: Stopwords,
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("analyzer_available", &self.analyzer.is_some())
            .field("allowed_pos", &self.allowed_pos)
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(Arc::new(ScriptRunAnalyzer::new()))
    }
}

impl Tokenizer {
    pub fn new(analyzer: Arc<dyn MorphologicalAnalyzer>) -> Self {
        Self {
            analyzer: Some(analyzer),
            allowed_pos: PosTag::CONTENT_WORDS.into_iter().collect(),
            stopwords: Stopwords::default(),
        }
    }

    /// Tokenizer whose analyzer failed to initialize; yields no tokens
    pub fn unavailable() -> Self {
        Self {
            analyzer: None,
            allowed_pos: PosTag::CONTENT_WORDS.into_iter().collect(),
            stopwords: Stopwords::default(),
        }
    }

    pub fn with_allowed_pos(mut self, allowed_pos: impl IntoIterator<Item = PosTag>) -> Self {
        self.allowed_pos = allowed_pos.into_iter().collect();
        self
    }

    pub fn with_stopwords(mut self, stopwords: Stopwords) -> Self {
        self.stopwords = stopwords;
        self
    }

    pub fn is_available(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Content words of `text` in order of appearance. Empty input or a
    /// missing analyzer give an empty sequence.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let Some(analyzer) = &self.analyzer else {
            warn!("Morphological analyzer unavailable, skipping tokenization");
            return Vec::new();
        };

        analyzer
            .analyze(text)
            .into_iter()
            .filter(|m| self.allowed_pos.contains(&m.pos))
            .map(|m| m.base_form)
            .filter(|word| self.keep(word))
            .collect()
    }

    fn keep(&self, word: &str) -> bool {
        if word.is_empty() || self.stopwords.contains(word) {
            return false;
        }

        let char_count = word.chars().count();
        if char_count < 2 && !is_kana_or_ideograph(word) {
            return false;
        }

        let numeric = word.chars().all(char::is_numeric);
        !(numeric && char_count > MAX_NUMERIC_TOKEN_LEN)
    }
}

/// `[ぁ-んァ-ヶー一-龠]+`: single characters in these ranges are meaningful
fn is_kana_or_ideograph(word: &str) -> bool {
    !word.is_empty()
        && word.chars().all(|c| {
            matches!(c,
                'ぁ'..='ん' | 'ァ'..='ヶ' | 'ー' | '一'..='龠')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::text::Morpheme;

    struct FixedAnalyzer(Vec<Morpheme>);

    impl MorphologicalAnalyzer for FixedAnalyzer {
        fn analyze(&self, _text: &str) -> Vec<Morpheme> {
            self.0.clone()
        }
    }

    fn morpheme(surface: &str, base: &str, pos: PosTag) -> Morpheme {
        Morpheme {
            surface: surface.to_string(),
            base_form: base.to_string(),
            pos,
        }
    }

    #[test]
    fn test_tokenize_keeps_content_words() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            tokenizer.tokenize("ハイキング 自然 登山"),
            vec!["ハイキング", "自然", "登山"]
        );
    }

    #[test]
    fn test_uses_base_form_and_filters_pos() {
        let analyzer = FixedAnalyzer(vec![
            morpheme("登っ", "登る", PosTag::Verb),
            morpheme("た", "た", PosTag::AuxiliaryVerb),
            morpheme("山", "山", PosTag::Noun),
            morpheme("を", "を", PosTag::Particle),
        ]);
        let tokenizer = Tokenizer::new(Arc::new(analyzer));
        assert_eq!(tokenizer.tokenize("山を登った"), vec!["登る", "山"]);
    }

    #[test]
    fn test_drops_stopwords_and_noise() {
        let analyzer = FixedAnalyzer(vec![
            morpheme("こと", "こと", PosTag::Noun),
            morpheme("x", "x", PosTag::Noun),
            morpheme("7", "7", PosTag::Noun),
            morpheme("山", "山", PosTag::Noun),
            morpheme("09012345678", "09012345678", PosTag::Noun),
            morpheme("2024", "2024", PosTag::Noun),
            morpheme("", "", PosTag::Noun),
        ]);
        let tokenizer = Tokenizer::new(Arc::new(analyzer));
        assert_eq!(tokenizer.tokenize("..."), vec!["山", "2024"]);
    }

    #[test]
    fn test_custom_allowed_pos() {
        let tokenizer = Tokenizer::default().with_allowed_pos([PosTag::Adjective]);
        assert_eq!(tokenizer.tokenize("高い 山"), vec!["高い"]);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(Tokenizer::default().tokenize("").is_empty());

        let unavailable = Tokenizer::unavailable();
        assert!(!unavailable.is_available());
        assert!(unavailable.tokenize("自然 登山").is_empty());
    }
}
