use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::RecommendationDataSource;
use crate::models::{CandidateEvent, LikedPost, OwnPost};

/// Data source backed by owned collections
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    own_posts: HashMap<Uuid, Vec<OwnPost>>,
    liked_posts: HashMap<Uuid, Vec<LikedPost>>,
    events: Vec<CandidateEvent>,
    interacted: HashMap<Uuid, HashSet<Uuid>>,
    declared_tags: HashMap<Uuid, Vec<Uuid>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_own_post(mut self, user_id: Uuid, post: OwnPost) -> Self {
        self.own_posts.entry(user_id).or_default().push(post);
        self
    }

    pub fn with_liked_post(mut self, user_id: Uuid, post: LikedPost) -> Self {
        self.liked_posts.entry(user_id).or_default().push(post);
        self
    }

    pub fn with_event(mut self, event: CandidateEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_interaction(mut self, user_id: Uuid, event_id: Uuid) -> Self {
        self.interacted.entry(user_id).or_default().insert(event_id);
        self
    }

    pub fn with_declared_tag(mut self, user_id: Uuid, tag_id: Uuid) -> Self {
        self.declared_tags.entry(user_id).or_default().push(tag_id);
        self
    }
}

#[async_trait]
impl RecommendationDataSource for InMemoryDataSource {
    async fn get_recent_own_posts(&self, user_id: Uuid, limit: i64) -> Result<Vec<OwnPost>> {
        let mut posts = self.own_posts.get(&user_id).cloned().unwrap_or_default();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }

    async fn get_liked_posts(&self, user_id: Uuid, limit: i64) -> Result<Vec<LikedPost>> {
        let mut posts = self.liked_posts.get(&user_id).cloned().unwrap_or_default();
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }

    async fn get_active_candidate_events(&self) -> Result<Vec<CandidateEvent>> {
        Ok(self.events.clone())
    }

    async fn get_user_interacted_event_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        Ok(self.interacted.get(&user_id).cloned().unwrap_or_default())
    }

    async fn get_user_declared_tags(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self.declared_tags.get(&user_id).cloned().unwrap_or_default())
    }
}
