// ============================================
// Event Recommender (推薦主流程)
// ============================================
//
// load -> tokenize -> vocabulary (cached) -> profile -> rank
//                                               |         |
//                                            absent     empty
//                                               \         /
//                                                fallback
//
// Only the candidate, authored-post and liked-post queries are required.
// Their failure surfaces as `RecommendError::Unavailable` carrying whatever
// the fallback strategies could build from the data that loaded.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RecommenderConfig;
use crate::db::RecommendationDataSource;
use crate::error::{DataStage, RecommendError, Result};
use crate::models::{CandidateEvent, RecommendationRecord, TextDocument};
use crate::services::fallback::{FallbackContext, FallbackRecommender};
use crate::services::profile_builder::{ProfileBuilder, ProfileBuilderConfig};
use crate::services::ranking::{CandidateVector, SimilarityRanker};
use crate::services::text::TextPipeline;
use crate::services::vector_space::{FittedVocabulary, VocabularyCache};

pub struct EventRecommender<D: RecommendationDataSource> {
    data_source: Arc<D>,
    pipeline: TextPipeline,
    vocabulary: VocabularyCache,
    profile_builder: ProfileBuilder,
    ranker: SimilarityRanker,
    fallback: FallbackRecommender,
    config: RecommenderConfig,
}

impl<D: RecommendationDataSource> EventRecommender<D> {
    /// Invalid settings are logged; `Config::from_env` rejects them up front
    pub fn new(data_source: Arc<D>, config: RecommenderConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "Recommender configured with invalid settings");
        }
        let pipeline = TextPipeline::from_config(&config);
        Self::with_pipeline(data_source, config, pipeline)
    }

    /// Use a custom text pipeline, e.g. one with a dictionary-backed analyzer
    pub fn with_pipeline(
        data_source: Arc<D>,
        config: RecommenderConfig,
        pipeline: TextPipeline,
    ) -> Self {
        Self {
            data_source,
            pipeline,
            vocabulary: VocabularyCache::new(config.refit_policy(), config.tfidf_max_features),
            profile_builder: ProfileBuilder::new(ProfileBuilderConfig::from(&config)),
            ranker: SimilarityRanker::new(),
            fallback: FallbackRecommender::default(),
            config,
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &VocabularyCache {
        &self.vocabulary
    }

    /// Force the next request to refit the vocabulary
    pub fn invalidate_vocabulary(&self) {
        self.vocabulary.invalidate();
    }

    /// Recommendations for `user_id` now, sized by `num_recommendations`
    pub async fn recommend(&self, user_id: Uuid) -> Result<Vec<RecommendationRecord>> {
        self.recommend_events_for_user(user_id, Utc::now(), self.config.num_recommendations)
            .await
    }

    pub async fn recommend_events_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        top_k: usize,
    ) -> Result<Vec<RecommendationRecord>> {
        let events = match self.data_source.get_active_candidate_events().await {
            Ok(events) => events,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to load candidate events");
                return Err(RecommendError::Unavailable {
                    stage: DataStage::CandidateEvents,
                    source: e,
                    fallback: Vec::new(),
                });
            }
        };

        let interacted = self.interacted_event_ids(user_id).await;

        let own_posts = match self
            .data_source
            .get_recent_own_posts(user_id, self.config.own_posts_limit)
            .await
        {
            Ok(posts) => posts,
            Err(e) => {
                return Err(self
                    .unavailable(user_id, DataStage::OwnPosts, e, &events, &interacted, top_k)
                    .await)
            }
        };

        let liked_posts = match self
            .data_source
            .get_liked_posts(user_id, self.config.liked_posts_limit)
            .await
        {
            Ok(posts) => posts,
            Err(e) => {
                return Err(self
                    .unavailable(user_id, DataStage::LikedPosts, e, &events, &interacted, top_k)
                    .await)
            }
        };

        debug!(
            user_id = %user_id,
            own_posts = own_posts.len(),
            liked_posts = liked_posts.len(),
            candidate_count = events.len(),
            interacted = interacted.len(),
            "Loaded recommendation inputs"
        );

        if own_posts.is_empty() && liked_posts.is_empty() {
            info!(user_id = %user_id, "No post history, using fallback");
            return Ok(self.fallback_for(user_id, &events, &interacted, top_k).await);
        }

        let own_tokens: Vec<(Vec<String>, DateTime<Utc>)> = own_posts
            .iter()
            .map(|post| {
                let doc = TextDocument::from_own_post(post);
                (self.pipeline.process_document(&doc), post.published_at)
            })
            .filter(|(tokens, _)| !tokens.is_empty())
            .collect();
        let liked_tokens: Vec<Vec<String>> = liked_posts
            .iter()
            .map(|post| self.pipeline.process_document(&TextDocument::from_liked_post(post)))
            .filter(|tokens| !tokens.is_empty())
            .collect();
        let event_tokens: Vec<Vec<String>> = events
            .iter()
            .map(|event| self.pipeline.process_document(&TextDocument::from_event(event)))
            .collect();

        let vocabulary = self.vocabulary.get_or_fit(now, || {
            own_tokens
                .iter()
                .map(|(tokens, _)| tokens.clone())
                .chain(liked_tokens.iter().cloned())
                .chain(event_tokens.iter().filter(|t| !t.is_empty()).cloned())
                .collect()
        });

        let Some(ranked) = self.rank_by_content(
            &vocabulary,
            &own_tokens,
            &liked_tokens,
            &event_tokens,
            &events,
            &interacted,
            now,
            top_k,
        ) else {
            info!(user_id = %user_id, "No content profile, using fallback");
            return Ok(self.fallback_for(user_id, &events, &interacted, top_k).await);
        };

        if ranked.is_empty() {
            info!(user_id = %user_id, "Content ranking left nothing, using fallback");
            return Ok(self.fallback_for(user_id, &events, &interacted, top_k).await);
        }

        info!(
            user_id = %user_id,
            count = ranked.len(),
            vocabulary_size = vocabulary.model().len(),
            "Serving content-based recommendations"
        );
        Ok(ranked)
    }

    /// `None` when no usable profile can be built in this vocabulary
    #[allow(clippy::too_many_arguments)]
    fn rank_by_content(
        &self,
        vocabulary: &FittedVocabulary,
        own_tokens: &[(Vec<String>, DateTime<Utc>)],
        liked_tokens: &[Vec<String>],
        event_tokens: &[Vec<String>],
        events: &[CandidateEvent],
        exclude_ids: &HashSet<Uuid>,
        now: DateTime<Utc>,
        top_k: usize,
    ) -> Option<Vec<RecommendationRecord>> {
        let model = vocabulary.model();
        if model.is_empty() {
            debug!("Vocabulary is empty");
            return None;
        }

        let own_vectors: Vec<_> = own_tokens
            .iter()
            .map(|(tokens, published_at)| (model.transform(tokens), *published_at))
            .collect();
        let liked_vectors: Vec<_> = liked_tokens.iter().map(|t| model.transform(t)).collect();

        let profile = self
            .profile_builder
            .build_profile(&own_vectors, &liked_vectors, now)?;
        if profile.norm() == 0.0 {
            debug!("Profile has no in-vocabulary terms");
            return None;
        }

        let candidates: Vec<CandidateVector> = events
            .iter()
            .zip(event_tokens)
            .map(|(event, tokens)| CandidateVector {
                event_id: event.event_id,
                title: event.title.clone(),
                vector: model.transform(tokens),
            })
            .collect();

        Some(self.ranker.rank(&profile, &candidates, exclude_ids, top_k))
    }

    async fn interacted_event_ids(&self, user_id: Uuid) -> HashSet<Uuid> {
        match self.data_source.get_user_interacted_event_ids(user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to load interacted events, excluding none");
                HashSet::new()
            }
        }
    }

    async fn fallback_for(
        &self,
        user_id: Uuid,
        events: &[CandidateEvent],
        exclude_ids: &HashSet<Uuid>,
        limit: usize,
    ) -> Vec<RecommendationRecord> {
        let declared_tags: HashSet<Uuid> =
            match self.data_source.get_user_declared_tags(user_id).await {
                Ok(tags) => tags.into_iter().collect(),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Failed to load declared tags");
                    HashSet::new()
                }
            };

        let ctx = FallbackContext {
            events,
            declared_tags: &declared_tags,
            exclude_ids,
        };
        self.fallback.recommend(&ctx, limit)
    }

    async fn unavailable(
        &self,
        user_id: Uuid,
        stage: DataStage,
        source: anyhow::Error,
        events: &[CandidateEvent],
        exclude_ids: &HashSet<Uuid>,
        limit: usize,
    ) -> RecommendError {
        warn!(user_id = %user_id, stage = %stage, error = %source, "Recommendation unavailable");
        RecommendError::Unavailable {
            stage,
            source,
            fallback: self.fallback_for(user_id, events, exclude_ids, limit).await,
        }
    }
}
