use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Post written by the target user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnPost {
    pub title: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
}

/// Post the target user liked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedPost {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// Active (not deleted, not ended) event that may be recommended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub event_id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<Tag>,
    /// Number of users who liked the event
    pub like_count: i64,
    pub participant_count: i64,
    pub published_at: Option<DateTime<Utc>>,
}

impl CandidateEvent {
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }

    pub fn has_any_tag(&self, tag_ids: &HashSet<Uuid>) -> bool {
        self.tags.iter().any(|t| tag_ids.contains(&t.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentOrigin {
    OwnPost,
    LikedPost,
    CandidateEvent,
}

/// Flattened text of one post or event, alive for a single request
#[derive(Debug, Clone)]
pub struct TextDocument {
    pub id: Option<Uuid>,
    pub text: String,
    pub tags: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub origin: DocumentOrigin,
}

impl TextDocument {
    pub fn from_own_post(post: &OwnPost) -> Self {
        Self {
            id: None,
            text: join_non_empty([post.title.as_str(), post.body.as_str()]),
            tags: Vec::new(),
            timestamp: Some(post.published_at),
            origin: DocumentOrigin::OwnPost,
        }
    }

    pub fn from_liked_post(post: &LikedPost) -> Self {
        Self {
            id: None,
            text: join_non_empty([post.title.as_str(), post.body.as_str()]),
            tags: Vec::new(),
            timestamp: None,
            origin: DocumentOrigin::LikedPost,
        }
    }

    pub fn from_event(event: &CandidateEvent) -> Self {
        Self {
            id: Some(event.event_id),
            text: join_non_empty([event.title.as_str(), event.description.as_str()]),
            tags: event.tag_names().map(str::to_string).collect(),
            timestamp: event.published_at,
            origin: DocumentOrigin::CandidateEvent,
        }
    }

    /// Text plus tag names, the form fed to the tokenizer
    pub fn full_text(&self) -> String {
        join_non_empty(
            std::iter::once(self.text.as_str()).chain(self.tags.iter().map(String::as_str)),
        )
    }
}

fn join_non_empty<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    ContentSimilarity,
    Popularity,
    TagMatch,
    Recency,
}

impl RecommendationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationReason::ContentSimilarity => "content_similarity",
            RecommendationReason::Popularity => "popularity",
            RecommendationReason::TagMatch => "tag_match",
            RecommendationReason::Recency => "recency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub event_id: Uuid,
    pub title: String,
    /// Cosine similarity in [0, 1]; `None` for fallback records
    pub score: Option<f64>,
    pub reason: RecommendationReason,
}

impl RecommendationRecord {
    pub fn similar(event_id: Uuid, title: impl Into<String>, score: f64) -> Self {
        Self {
            event_id,
            title: title.into(),
            score: Some(score),
            reason: RecommendationReason::ContentSimilarity,
        }
    }

    pub fn fallback(event: &CandidateEvent, reason: RecommendationReason) -> Self {
        Self {
            event_id: event.event_id,
            title: event.title.clone(),
            score: None,
            reason,
        }
    }
}
