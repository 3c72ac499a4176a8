use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::models::RecommendationRecord;
use crate::services::profile_builder::UserProfile;
use crate::services::vector_space::DocumentVector;
use crate::utils::clamp_unit;

/// Event vectorized in the request's vocabulary
#[derive(Debug, Clone)]
pub struct CandidateVector {
    pub event_id: Uuid,
    pub title: String,
    pub vector: DocumentVector,
}

/// Similarity Ranker - 內容相似度排序
/// Scores candidates by cosine similarity to the user profile
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityRanker;

impl SimilarityRanker {
    pub fn new() -> Self {
        Self
    }

    /// Score every candidate, drop excluded ids, sort by similarity
    /// descending (input order on ties) and keep the first `top_k`.
    ///
    /// An empty result means nothing survived exclusion; the caller decides
    /// what to serve instead.
    pub fn rank(
        &self,
        profile: &UserProfile,
        candidates: &[CandidateVector],
        exclude_ids: &HashSet<Uuid>,
        top_k: usize,
    ) -> Vec<RecommendationRecord> {
        let profile_norm = profile.norm();

        let mut scored: Vec<(&CandidateVector, f64)> = candidates
            .iter()
            .map(|candidate| {
                (
                    candidate,
                    cosine_similarity(profile, profile_norm, &candidate.vector),
                )
            })
            .collect();

        // Stable sort keeps input order for equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let excluded = scored
            .iter()
            .filter(|(c, _)| exclude_ids.contains(&c.event_id))
            .count();

        let ranked: Vec<RecommendationRecord> = scored
            .into_iter()
            .filter(|(c, _)| !exclude_ids.contains(&c.event_id))
            .take(top_k)
            .map(|(c, score)| RecommendationRecord::similar(c.event_id, c.title.clone(), score))
            .collect();

        debug!(
            candidates = candidates.len(),
            excluded,
            returned = ranked.len(),
            "Ranked candidates by content similarity"
        );

        ranked
    }
}

/// Cosine similarity in [0, 1]. Zero vectors score 0.
fn cosine_similarity(profile: &UserProfile, profile_norm: f64, candidate: &DocumentVector) -> f64 {
    let candidate_norm = candidate.norm();
    if profile_norm == 0.0 || candidate_norm == 0.0 {
        return 0.0;
    }

    let dot = candidate.dot_dense(profile.vector());
    clamp_unit(dot / (profile_norm * candidate_norm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationReason;
    use crate::services::vector_space::VocabularyModel;
    use ndarray::Array1;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn setup() -> (VocabularyModel, Vec<CandidateVector>) {
        let docs = vec![
            tokens(&["自然", "登山", "コース"]),
            tokens(&["ショッピング", "セール"]),
            tokens(&["カフェ", "自然"]),
        ];
        let model = VocabularyModel::fit(&docs, 100);
        let candidates = docs
            .iter()
            .enumerate()
            .map(|(i, doc)| CandidateVector {
                event_id: Uuid::from_u128(i as u128 + 1),
                title: format!("event-{}", i + 1),
                vector: model.transform(doc),
            })
            .collect();
        (model, candidates)
    }

    fn profile_of(model: &VocabularyModel, words: &[&str]) -> UserProfile {
        UserProfile::new(model.transform(&tokens(words)).to_dense())
    }

    #[test]
    fn test_rank_by_similarity() {
        let (model, candidates) = setup();
        let profile = profile_of(&model, &["登山", "自然"]);

        let ranked = SimilarityRanker::new().rank(&profile, &candidates, &HashSet::new(), 5);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].event_id, Uuid::from_u128(1));
        assert_eq!(ranked[1].event_id, Uuid::from_u128(3));
        assert_eq!(ranked[2].event_id, Uuid::from_u128(2));
        assert_eq!(ranked[2].score, Some(0.0));
        assert!(ranked
            .iter()
            .all(|r| r.reason == RecommendationReason::ContentSimilarity));
        assert!(ranked
            .iter()
            .all(|r| r.score.is_some_and(|s| (0.0..=1.0).contains(&s))));
    }

    #[test]
    fn test_exclusion_and_top_k() {
        let (model, candidates) = setup();
        let profile = profile_of(&model, &["自然"]);
        let exclude: HashSet<Uuid> = [Uuid::from_u128(1)].into_iter().collect();

        let ranked = SimilarityRanker::new().rank(&profile, &candidates, &exclude, 1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].event_id, Uuid::from_u128(3));
    }

    #[test]
    fn test_all_excluded_is_empty() {
        let (model, candidates) = setup();
        let profile = profile_of(&model, &["自然"]);
        let exclude: HashSet<Uuid> = candidates.iter().map(|c| c.event_id).collect();

        assert!(SimilarityRanker::new()
            .rank(&profile, &candidates, &exclude, 5)
            .is_empty());
    }

    #[test]
    fn test_zero_vectors_score_zero() {
        let (model, mut candidates) = setup();
        candidates.push(CandidateVector {
            event_id: Uuid::from_u128(9),
            title: "oov".to_string(),
            vector: model.transform(&tokens(&["宇宙"])),
        });

        let zero_profile = UserProfile::new(Array1::zeros(model.len()));
        let ranked = SimilarityRanker::new().rank(&zero_profile, &candidates, &HashSet::new(), 10);

        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|r| r.score == Some(0.0)));
        // Ties keep input order
        let ids: Vec<u128> = ranked.iter().map(|r| r.event_id.as_u128()).collect();
        assert_eq!(ids, vec![1, 2, 3, 9]);
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let (model, candidates) = setup();
        let profile = UserProfile::new(candidates[1].vector.to_dense());
        let ranked = SimilarityRanker::new().rank(&profile, &candidates, &HashSet::new(), 1);

        assert_eq!(ranked[0].event_id, Uuid::from_u128(2));
        assert!((ranked[0].score.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(model.len(), 6);
    }
}
