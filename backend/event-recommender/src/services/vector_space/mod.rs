// ============================================
// Vector Space (TF-IDF)
// ============================================
//
// weight(term, doc) = tf(term, doc) * idf(term)
// idf(term)         = ln((1 + n_docs) / (1 + df(term))) + 1
//
// tf is the raw count; vectors are not length-normalized here since cosine
// similarity normalizes at scoring time.

mod cache;

pub use cache::{FittedVocabulary, RefitPolicy, VocabularyCache};

use ndarray::Array1;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Fitted term index plus IDF weights. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyModel {
    index: HashMap<String, usize>,
    idf: Vec<f64>,
    document_count: usize,
}

impl VocabularyModel {
    /// Fit over tokenized documents, keeping at most `max_features` terms
    /// ranked by total corpus frequency.
    pub fn fit(corpus: &[Vec<String>], max_features: usize) -> Self {
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        let mut corpus_frequency: HashMap<&str, usize> = HashMap::new();

        for tokens in corpus {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in tokens {
                *corpus_frequency.entry(token.as_str()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *document_frequency.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = corpus_frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features);

        // Indices follow term order so identical corpora give identical models
        let mut terms: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort_unstable();

        let n = corpus.len() as f64;
        let mut index = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (i, term) in terms.into_iter().enumerate() {
            let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
            idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
            index.insert(term.to_string(), i);
        }

        debug!(
            documents = corpus.len(),
            vocabulary_size = index.len(),
            "Fitted TF-IDF vocabulary"
        );

        Self {
            index,
            idf,
            document_count: corpus.len(),
        }
    }

    /// TF-IDF vector of `tokens`; out-of-vocabulary tokens are ignored
    pub fn transform(&self, tokens: &[String]) -> DocumentVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokens {
            if let Some(&i) = self.index.get(token) {
                *counts.entry(i).or_insert(0.0) += 1.0;
            }
        }

        let entries = counts
            .into_iter()
            .map(|(i, tf)| (i, tf * self.idf[i]))
            .collect();

        DocumentVector {
            dim: self.len(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index.get(term).map(|&i| self.idf[i])
    }
}

/// Sparse vector in a `VocabularyModel`'s space, entries sorted by index
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl DocumentVector {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|&(_, w)| w == 0.0)
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt()
    }

    pub fn get(&self, i: usize) -> f64 {
        self.entries
            .binary_search_by_key(&i, |&(idx, _)| idx)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product with a dense vector of the same dimension
    pub fn dot_dense(&self, dense: &Array1<f64>) -> f64 {
        assert_eq!(
            self.dim,
            dense.len(),
            "vector dimension mismatch: document {} vs dense {}",
            self.dim,
            dense.len()
        );
        self.entries.iter().map(|&(i, w)| w * dense[i]).sum()
    }

    /// `dense += scale * self`
    pub fn add_scaled_to(&self, dense: &mut Array1<f64>, scale: f64) {
        assert_eq!(
            self.dim,
            dense.len(),
            "vector dimension mismatch: document {} vs dense {}",
            self.dim,
            dense.len()
        );
        for &(i, w) in &self.entries {
            dense[i] += scale * w;
        }
    }

    pub fn to_dense(&self) -> Array1<f64> {
        let mut dense = Array1::zeros(self.dim);
        self.add_scaled_to(&mut dense, 1.0);
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn corpus() -> Vec<Vec<String>> {
        vec![
            doc(&["ハイキング", "自然", "登山"]),
            doc(&["カフェ", "自然"]),
            doc(&["自然", "登山", "コース"]),
            doc(&["ショッピング", "セール"]),
        ]
    }

    #[test]
    fn test_fit_vocabulary_and_idf() {
        let model = VocabularyModel::fit(&corpus(), 5000);
        assert_eq!(model.len(), 7);
        assert_eq!(model.document_count(), 4);

        // 自然 appears in 3 of 4 documents: ln(5/4) + 1
        let idf = model.idf("自然").unwrap();
        assert!((idf - ((5.0_f64 / 4.0).ln() + 1.0)).abs() < 1e-12);

        // Rarer terms weigh more
        assert!(model.idf("カフェ").unwrap() > idf);
    }

    #[test]
    fn test_transform_counts_and_ignores_oov() {
        let model = VocabularyModel::fit(&corpus(), 5000);
        let vector = model.transform(&doc(&["登山", "登山", "未知語"]));

        assert_eq!(vector.dim(), model.len());
        assert_eq!(vector.entries().len(), 1);
        let expected = 2.0 * model.idf("登山").unwrap();
        let (idx, weight) = vector.entries()[0];
        assert!((weight - expected).abs() < 1e-12);
        assert!((vector.get(idx) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_all_oov_is_zero_vector() {
        let model = VocabularyModel::fit(&corpus(), 5000);
        let vector = model.transform(&doc(&["宇宙", "ロケット"]));
        assert!(vector.is_zero());
        assert_eq!(vector.norm(), 0.0);
        assert_eq!(vector, DocumentVector::zeros(model.len()));
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let model = VocabularyModel::fit(&corpus(), 2);
        assert_eq!(model.len(), 2);
        assert!(model.contains("自然"));
        assert!(model.contains("登山"));
        assert!(!model.contains("カフェ"));
    }

    #[test]
    fn test_fit_is_idempotent() {
        let first = VocabularyModel::fit(&corpus(), 5000);
        let second = VocabularyModel::fit(&corpus(), 5000);
        assert_eq!(first, second);

        let tokens = doc(&["自然", "カフェ", "登山"]);
        assert_eq!(first.transform(&tokens), second.transform(&tokens));
    }

    #[test]
    fn test_empty_corpus() {
        let model = VocabularyModel::fit(&[], 5000);
        assert!(model.is_empty());
        assert!(model.transform(&doc(&["自然"])).is_zero());
    }

    #[test]
    fn test_dense_helpers() {
        let model = VocabularyModel::fit(&corpus(), 5000);
        let vector = model.transform(&doc(&["自然", "カフェ"]));
        let dense = vector.to_dense();

        assert!((vector.dot_dense(&dense) - vector.norm().powi(2)).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "vector dimension mismatch")]
    fn test_dimension_mismatch_panics() {
        let vector = DocumentVector::zeros(3);
        vector.dot_dense(&Array1::zeros(4));
    }
}
