// ============================================
// Profile Builder (用戶興趣向量)
// ============================================
//
// own   = Σ(v_i * decay(t_i)) / Σ decay(t_i)      authored posts, recency-weighted
// liked = mean(v_j)                                liked posts, unweighted
// final = alpha * own + (1 - alpha) * liked
//
// A missing side hands the other through unchanged; both missing means no
// profile and the caller falls back.

use chrono::{DateTime, Utc};
use ndarray::Array1;
use tracing::debug;

use crate::config::RecommenderConfig;
use crate::services::vector_space::DocumentVector;
use crate::utils::RecencyDecay;

/// Weight sums at or below this are treated as underflow
const MIN_WEIGHT_SUM: f64 = f64::MIN_POSITIVE;

/// A user's inferred interest, dense in the vocabulary's space
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    vector: Array1<f64>,
}

impl UserProfile {
    pub fn new(vector: Array1<f64>) -> Self {
        Self { vector }
    }

    pub fn vector(&self) -> &Array1<f64> {
        &self.vector
    }

    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    pub fn norm(&self) -> f64 {
        self.vector.dot(&self.vector).sqrt()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileBuilderConfig {
    /// Share of the authored-post profile
    pub alpha: f64,
    pub decay: RecencyDecay,
}

impl Default for ProfileBuilderConfig {
    fn default() -> Self {
        Self::from(&RecommenderConfig::default())
    }
}

impl From<&RecommenderConfig> for ProfileBuilderConfig {
    fn from(config: &RecommenderConfig) -> Self {
        Self {
            alpha: config.alpha_profile_weight,
            decay: RecencyDecay::with_future_weight(
                config.lambda_decay,
                config.future_post_weight,
            ),
        }
    }
}

pub struct ProfileBuilder {
    config: ProfileBuilderConfig,
}

impl ProfileBuilder {
    pub fn new(config: ProfileBuilderConfig) -> Self {
        Self { config }
    }

    /// Blend authored and liked post vectors into one profile.
    ///
    /// Panics if the vectors do not all share one dimension: that means they
    /// came from different vocabularies.
    pub fn build_profile(
        &self,
        own_posts: &[(DocumentVector, DateTime<Utc>)],
        liked_posts: &[DocumentVector],
        now: DateTime<Utc>,
    ) -> Option<UserProfile> {
        let own = self.own_posts_profile(own_posts, now);
        let liked = liked_posts_profile(liked_posts);

        let profile = match (own, liked) {
            (None, None) => return None,
            (Some(own), None) => own,
            (None, Some(liked)) => liked,
            (Some(own), Some(liked)) => {
                assert_eq!(
                    own.len(),
                    liked.len(),
                    "profile dimension mismatch: own {} vs liked {}",
                    own.len(),
                    liked.len()
                );
                own * self.config.alpha + liked * (1.0 - self.config.alpha)
            }
        };

        Some(UserProfile::new(profile))
    }

    /// Recency-weighted mean of authored post vectors
    pub fn own_posts_profile(
        &self,
        own_posts: &[(DocumentVector, DateTime<Utc>)],
        now: DateTime<Utc>,
    ) -> Option<Array1<f64>> {
        let dim = common_dim(own_posts.iter().map(|(v, _)| v))?;

        let mut weighted_sum = Array1::zeros(dim);
        let mut total_weight = 0.0;
        for (vector, published_at) in own_posts {
            let weight = self.config.decay.weight(*published_at, now);
            vector.add_scaled_to(&mut weighted_sum, weight);
            total_weight += weight;
        }

        if total_weight > MIN_WEIGHT_SUM && total_weight.is_finite() {
            return Some(weighted_sum / total_weight);
        }

        debug!(
            posts = own_posts.len(),
            "Recency weights underflowed, using unweighted mean"
        );
        mean(own_posts.iter().map(|(v, _)| v), dim)
    }
}

/// Arithmetic mean of liked post vectors
pub fn liked_posts_profile(liked_posts: &[DocumentVector]) -> Option<Array1<f64>> {
    let dim = common_dim(liked_posts.iter())?;
    mean(liked_posts.iter(), dim)
}

fn mean<'a>(vectors: impl Iterator<Item = &'a DocumentVector>, dim: usize) -> Option<Array1<f64>> {
    let mut sum = Array1::zeros(dim);
    let mut count = 0usize;
    for vector in vectors {
        vector.add_scaled_to(&mut sum, 1.0);
        count += 1;
    }

    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Dimension shared by all vectors, `None` when there are none
fn common_dim<'a>(mut vectors: impl Iterator<Item = &'a DocumentVector>) -> Option<usize> {
    let dim = vectors.next()?.dim();
    for vector in vectors {
        assert_eq!(
            vector.dim(),
            dim,
            "vector dimension mismatch inside one profile: {} vs {}",
            vector.dim(),
            dim
        );
    }
    Some(dim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vector_space::VocabularyModel;
    use chrono::Duration;

    fn model() -> VocabularyModel {
        let corpus: Vec<Vec<String>> = [vec!["自然", "登山"], vec!["カフェ", "読書"]]
            .iter()
            .map(|doc| doc.iter().map(|w| w.to_string()).collect())
            .collect();
        VocabularyModel::fit(&corpus, 100)
    }

    fn vector(model: &VocabularyModel, words: &[&str]) -> DocumentVector {
        let tokens: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        model.transform(&tokens)
    }

    fn builder(alpha: f64) -> ProfileBuilder {
        ProfileBuilder::new(ProfileBuilderConfig {
            alpha,
            decay: RecencyDecay::new(0.01),
        })
    }

    #[test]
    fn test_no_signal_means_no_profile() {
        assert!(builder(0.7).build_profile(&[], &[], Utc::now()).is_none());
    }

    #[test]
    fn test_single_side_passes_through() {
        let model = model();
        let now = Utc::now();
        let liked = vec![vector(&model, &["カフェ"]), vector(&model, &["読書"])];

        let profile = builder(0.7).build_profile(&[], &liked, now).unwrap();
        let expected = (liked[0].to_dense() + liked[1].to_dense()) / 2.0;
        assert_eq!(profile.vector(), &expected);

        let own = vec![(vector(&model, &["登山"]), now - Duration::hours(5))];
        let profile = builder(0.7).build_profile(&own, &[], now).unwrap();
        let expected = own[0].0.to_dense();
        for (a, b) in profile.vector().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_blend_uses_alpha() {
        let model = model();
        let now = Utc::now();
        let own = vec![(vector(&model, &["登山"]), now)];
        let liked = vec![vector(&model, &["カフェ"])];

        let profile = builder(0.7).build_profile(&own, &liked, now).unwrap();
        let expected = own[0].0.to_dense() * 0.7 + liked[0].to_dense() * 0.3;
        for (a, b) in profile.vector().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_recent_posts_dominate() {
        let model = model();
        let now = Utc::now();
        let own = vec![
            (vector(&model, &["登山"]), now - Duration::hours(1)),
            (vector(&model, &["読書"]), now - Duration::days(60)),
        ];

        let profile = builder(1.0).own_posts_profile(&own, now).unwrap();
        let hiking = own[0].0.entries()[0].0;
        let reading = own[1].0.entries()[0].0;
        assert!(profile[hiking] > profile[reading] * 100.0);
    }

    #[test]
    fn test_underflow_falls_back_to_mean() {
        let model = model();
        let now = Utc::now();
        let ancient = now - Duration::days(365 * 100);
        let own = vec![
            (vector(&model, &["登山"]), ancient),
            (vector(&model, &["読書"]), ancient),
        ];

        let profile = builder(1.0).own_posts_profile(&own, now).unwrap();
        let expected = (own[0].0.to_dense() + own[1].0.to_dense()) / 2.0;
        assert_eq!(profile, expected);
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn test_mixed_vocabularies_panic() {
        let now = Utc::now();
        let own = vec![(DocumentVector::zeros(3), now)];
        let liked = vec![DocumentVector::zeros(5)];
        builder(0.7).build_profile(&own, &liked, now);
    }
}
