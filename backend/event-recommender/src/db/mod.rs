mod memory;
mod postgres;

pub use memory::InMemoryDataSource;
pub use postgres::{PgRecommendationDataSource, TaggedEntity};

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{CandidateEvent, LikedPost, OwnPost};

/// Read-only queries the recommender needs from platform storage.
/// Implement this trait to integrate with an existing store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationDataSource: Send + Sync {
    /// Most recent posts authored by the user, newest first
    async fn get_recent_own_posts(&self, user_id: Uuid, limit: i64) -> Result<Vec<OwnPost>>;

    /// Posts the user liked, newest first
    async fn get_liked_posts(&self, user_id: Uuid, limit: i64) -> Result<Vec<LikedPost>>;

    /// Events that are neither deleted nor ended
    async fn get_active_candidate_events(&self) -> Result<Vec<CandidateEvent>>;

    /// Events the user joined or liked
    async fn get_user_interacted_event_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;

    /// Tag ids the user declared as interests
    async fn get_user_declared_tags(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
}
