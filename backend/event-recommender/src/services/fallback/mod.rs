// ============================================
// Fallback Recommender (冷啟動推薦)
// ============================================
//
// Used when there is no content profile or content ranking leaves nothing.
// Strategies run in order until one returns at least one record:
//   1. Popularity  - liked events by likes, participants, publish time
//   2. Tag match   - events sharing a declared tag, newest first
//   3. Recency     - newest active events
// Never fails; an empty catalog gives an empty list.

use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{CandidateEvent, RecommendationReason, RecommendationRecord};

/// Inputs shared by every fallback strategy
#[derive(Debug, Clone, Copy)]
pub struct FallbackContext<'a> {
    pub events: &'a [CandidateEvent],
    pub declared_tags: &'a HashSet<Uuid>,
    /// Events the user already joined or liked
    pub exclude_ids: &'a HashSet<Uuid>,
}

impl<'a> FallbackContext<'a> {
    fn eligible(&self) -> impl Iterator<Item = &'a CandidateEvent> {
        let exclude_ids = self.exclude_ids;
        self.events
            .iter()
            .filter(move |e| !exclude_ids.contains(&e.event_id))
    }
}

pub trait FallbackStrategy: Send + Sync {
    fn recommend(&self, ctx: &FallbackContext<'_>, limit: usize) -> Vec<RecommendationRecord>;
    fn reason(&self) -> RecommendationReason;
}

/// Newest first, undated events last
fn by_published_desc(a: &CandidateEvent, b: &CandidateEvent) -> Ordering {
    b.published_at.cmp(&a.published_at)
}

fn to_records<'a>(
    events: impl IntoIterator<Item = &'a CandidateEvent>,
    reason: RecommendationReason,
    limit: usize,
) -> Vec<RecommendationRecord> {
    events
        .into_iter()
        .take(limit)
        .map(|e| RecommendationRecord::fallback(e, reason))
        .collect()
}

pub struct PopularityStrategy;

impl FallbackStrategy for PopularityStrategy {
    fn recommend(&self, ctx: &FallbackContext<'_>, limit: usize) -> Vec<RecommendationRecord> {
        let mut popular: Vec<&CandidateEvent> =
            ctx.eligible().filter(|e| e.like_count > 0).collect();

        popular.sort_by(|a, b| {
            b.like_count
                .cmp(&a.like_count)
                .then_with(|| b.participant_count.cmp(&a.participant_count))
                .then_with(|| by_published_desc(a, b))
        });

        to_records(popular, self.reason(), limit)
    }

    fn reason(&self) -> RecommendationReason {
        RecommendationReason::Popularity
    }
}

pub struct TagMatchStrategy;

impl FallbackStrategy for TagMatchStrategy {
    fn recommend(&self, ctx: &FallbackContext<'_>, limit: usize) -> Vec<RecommendationRecord> {
        if ctx.declared_tags.is_empty() {
            return Vec::new();
        }

        let mut matched: Vec<&CandidateEvent> = ctx
            .eligible()
            .filter(|e| e.has_any_tag(ctx.declared_tags))
            .collect();
        matched.sort_by(|a, b| by_published_desc(a, b));

        to_records(matched, self.reason(), limit)
    }

    fn reason(&self) -> RecommendationReason {
        RecommendationReason::TagMatch
    }
}

/// Newest events. Prefers ones the user has not interacted with, but still
/// returns something when every event was already seen.
pub struct RecencyStrategy;

impl FallbackStrategy for RecencyStrategy {
    fn recommend(&self, ctx: &FallbackContext<'_>, limit: usize) -> Vec<RecommendationRecord> {
        let mut recent: Vec<&CandidateEvent> = ctx.eligible().collect();
        if recent.is_empty() {
            recent = ctx.events.iter().collect();
        }
        recent.sort_by(|a, b| by_published_desc(a, b));

        to_records(recent, self.reason(), limit)
    }

    fn reason(&self) -> RecommendationReason {
        RecommendationReason::Recency
    }
}

pub struct FallbackRecommender {
    strategies: Vec<Box<dyn FallbackStrategy>>,
}

impl Default for FallbackRecommender {
    fn default() -> Self {
        Self::new(vec![
            Box::new(PopularityStrategy),
            Box::new(TagMatchStrategy),
            Box::new(RecencyStrategy),
        ])
    }
}

impl FallbackRecommender {
    pub fn new(strategies: Vec<Box<dyn FallbackStrategy>>) -> Self {
        Self { strategies }
    }

    /// First non-empty strategy result, or an empty list
    pub fn recommend(&self, ctx: &FallbackContext<'_>, limit: usize) -> Vec<RecommendationRecord> {
        for strategy in &self.strategies {
            let records = strategy.recommend(ctx, limit);
            if !records.is_empty() {
                info!(
                    strategy = strategy.reason().as_str(),
                    count = records.len(),
                    "Serving fallback recommendations"
                );
                return records;
            }
            debug!(
                strategy = strategy.reason().as_str(),
                "Fallback strategy produced nothing"
            );
        }

        info!(
            events = ctx.events.len(),
            "No fallback recommendations available"
        );
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use chrono::{Duration, TimeZone, Utc};

    fn tag(n: u128) -> Tag {
        Tag {
            id: Uuid::from_u128(1000 + n),
            name: format!("tag-{}", n),
        }
    }

    fn event(n: u128, likes: i64, participants: i64, hours_ago: i64, tags: Vec<Tag>) -> CandidateEvent {
        let base = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        CandidateEvent {
            event_id: Uuid::from_u128(n),
            title: format!("event-{}", n),
            description: String::new(),
            tags,
            like_count: likes,
            participant_count: participants,
            published_at: Some(base - Duration::hours(hours_ago)),
        }
    }

    fn ids(records: &[RecommendationRecord]) -> Vec<u128> {
        records.iter().map(|r| r.event_id.as_u128()).collect()
    }

    #[test]
    fn test_popularity_ordering() {
        let events = vec![
            event(1, 2, 1, 1, vec![]),
            event(2, 5, 1, 10, vec![]),
            event(3, 2, 8, 20, vec![]),
            event(4, 2, 8, 2, vec![]),
            event(5, 0, 50, 0, vec![]),
        ];
        let none = HashSet::new();
        let ctx = FallbackContext {
            events: &events,
            declared_tags: &none,
            exclude_ids: &none,
        };

        let records = PopularityStrategy.recommend(&ctx, 10);
        assert_eq!(ids(&records), vec![2, 4, 3, 1]);
        assert!(records
            .iter()
            .all(|r| r.score.is_none() && r.reason == RecommendationReason::Popularity));
    }

    #[test]
    fn test_popularity_needs_likes() {
        let events = vec![event(1, 0, 3, 1, vec![]), event(2, 0, 9, 2, vec![])];
        let none = HashSet::new();
        let ctx = FallbackContext {
            events: &events,
            declared_tags: &none,
            exclude_ids: &none,
        };
        assert!(PopularityStrategy.recommend(&ctx, 5).is_empty());
    }

    #[test]
    fn test_tag_match_only_when_no_popularity() {
        let events = vec![
            event(1, 0, 1, 3, vec![tag(1)]),
            event(2, 0, 1, 1, vec![tag(3)]),
            event(3, 0, 1, 2, vec![]),
        ];
        let declared: HashSet<Uuid> = [tag(1).id, tag(2).id].into_iter().collect();
        let none = HashSet::new();
        let ctx = FallbackContext {
            events: &events,
            declared_tags: &declared,
            exclude_ids: &none,
        };

        let records = FallbackRecommender::default().recommend(&ctx, 5);
        assert_eq!(ids(&records), vec![1]);
        assert_eq!(records[0].reason, RecommendationReason::TagMatch);
    }

    #[test]
    fn test_popularity_and_tag_match_skip_interacted() {
        let events = vec![
            event(1, 5, 1, 1, vec![tag(1)]),
            event(2, 0, 1, 2, vec![tag(1)]),
            event(3, 0, 1, 3, vec![tag(1)]),
        ];
        let declared: HashSet<Uuid> = [tag(1).id].into_iter().collect();
        let exclude: HashSet<Uuid> = [Uuid::from_u128(1), Uuid::from_u128(2)]
            .into_iter()
            .collect();
        let ctx = FallbackContext {
            events: &events,
            declared_tags: &declared,
            exclude_ids: &exclude,
        };

        assert!(PopularityStrategy.recommend(&ctx, 5).is_empty());
        assert_eq!(ids(&TagMatchStrategy.recommend(&ctx, 5)), vec![3]);

        let records = FallbackRecommender::default().recommend(&ctx, 5);
        assert_eq!(ids(&records), vec![3]);
        assert_eq!(records[0].reason, RecommendationReason::TagMatch);
    }

    #[test]
    fn test_recency_when_no_tags() {
        let events = vec![
            event(1, 0, 1, 30, vec![]),
            event(2, 0, 1, 5, vec![]),
            event(3, 0, 1, 10, vec![]),
        ];
        let none = HashSet::new();
        let exclude: HashSet<Uuid> = [Uuid::from_u128(2)].into_iter().collect();
        let ctx = FallbackContext {
            events: &events,
            declared_tags: &none,
            exclude_ids: &exclude,
        };

        let records = FallbackRecommender::default().recommend(&ctx, 5);
        assert_eq!(ids(&records), vec![3, 1]);
        assert!(records
            .iter()
            .all(|r| r.reason == RecommendationReason::Recency));
    }

    #[test]
    fn test_recency_serves_seen_events_as_last_resort() {
        let events = vec![event(1, 0, 1, 30, vec![]), event(2, 0, 1, 5, vec![])];
        let none = HashSet::new();
        let exclude: HashSet<Uuid> = events.iter().map(|e| e.event_id).collect();
        let ctx = FallbackContext {
            events: &events,
            declared_tags: &none,
            exclude_ids: &exclude,
        };

        let records = FallbackRecommender::default().recommend(&ctx, 1);
        assert_eq!(ids(&records), vec![2]);
    }

    #[test]
    fn test_undated_events_sort_last() {
        let mut undated = event(1, 0, 1, 0, vec![]);
        undated.published_at = None;
        let events = vec![undated, event(2, 0, 1, 100, vec![])];
        let none = HashSet::new();
        let ctx = FallbackContext {
            events: &events,
            declared_tags: &none,
            exclude_ids: &none,
        };

        assert_eq!(ids(&RecencyStrategy.recommend(&ctx, 5)), vec![2, 1]);
    }

    #[test]
    fn test_empty_catalog() {
        let none = HashSet::new();
        let ctx = FallbackContext {
            events: &[],
            declared_tags: &none,
            exclude_ids: &none,
        };
        assert!(FallbackRecommender::default().recommend(&ctx, 5).is_empty());
    }
}
