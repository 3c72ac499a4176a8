// ============================================
// Text Pipeline
// ============================================
//
// raw text -> normalize -> morphological analysis -> POS / stopword filter
//
// Every document type (authored post, liked post, event) goes through the
// same pipeline so their tokens share one vocabulary.

mod analyzer;
mod normalizer;
mod stopwords;
mod tokenizer;

pub use analyzer::{Morpheme, MorphologicalAnalyzer, PosTag, ScriptRunAnalyzer};
pub use normalizer::normalize;
pub use stopwords::{Stopwords, DEFAULT_STOPWORDS};
pub use tokenizer::Tokenizer;

use tracing::warn;

use crate::config::RecommenderConfig;
use crate::models::TextDocument;

/// Normalizer and tokenizer applied in sequence
#[derive(Debug, Clone, Default)]
pub struct TextPipeline {
    tokenizer: Tokenizer,
}

impl TextPipeline {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Default analyzer with the configured POS set and extra stopwords.
    /// Unknown POS names are skipped with a warning; when none is usable the
    /// default content-word set applies.
    pub fn from_config(config: &RecommenderConfig) -> Self {
        let mut allowed_pos: Vec<PosTag> = Vec::new();
        for name in &config.allowed_pos {
            match name.parse::<PosTag>() {
                Ok(pos) => allowed_pos.push(pos),
                Err(e) => warn!(error = %e, "Ignoring configured part of speech"),
            }
        }

        if allowed_pos.is_empty() {
            warn!(
                configured = ?config.allowed_pos,
                "No usable part of speech configured, keeping default content words"
            );
            allowed_pos = PosTag::CONTENT_WORDS.to_vec();
        }

        let tokenizer = Tokenizer::default()
            .with_allowed_pos(allowed_pos)
            .with_stopwords(Stopwords::with_extra(&config.extra_stopwords));

        Self::new(tokenizer)
    }

    pub fn process(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.tokenizer.tokenize(&normalize(text))
    }

    /// Joins the non-empty parts with a space before processing
    pub fn process_parts<S: AsRef<str>>(&self, parts: &[S]) -> Vec<String> {
        let combined = parts
            .iter()
            .map(AsRef::as_ref)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        self.process(&combined)
    }

    pub fn process_document(&self, document: &TextDocument) -> Vec<String> {
        self.process(&document.full_text())
    }
}
