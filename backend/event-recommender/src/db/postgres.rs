use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

use super::RecommendationDataSource;
use crate::config::DatabaseConfig;
use crate::models::{CandidateEvent, LikedPost, OwnPost, Tag};

/// Entity kinds sharing the `tag_association` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggedEntity {
    User,
    Event,
    Thread,
}

impl TaggedEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaggedEntity::User => "user",
            TaggedEntity::Event => "event",
            TaggedEntity::Thread => "thread",
        }
    }
}

/// PostgreSQL implementation over the platform schema
#[derive(Clone)]
pub struct PgRecommendationDataSource {
    pool: PgPool,
    /// Zone assumed for `timestamp without time zone` columns
    naive_offset: FixedOffset,
}

impl PgRecommendationDataSource {
    pub fn new(pool: PgPool, naive_utc_offset_hours: i32) -> Self {
        let naive_offset =
            FixedOffset::east_opt(naive_utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self { pool, naive_offset }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self::new(pool, config.naive_utc_offset_hours))
    }

    fn to_utc(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        self.naive_offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    }

    /// Tags per event id. Lookup failures leave events untagged.
    async fn event_tags(&self, event_ids: &[String]) -> HashMap<String, Vec<Tag>> {
        if event_ids.is_empty() {
            return HashMap::new();
        }

        let rows = sqlx::query_as::<_, EventTagRow>(
            r#"
            SELECT ta.entity_id, tm.id AS tag_id, tm.tag_name
            FROM tag_association ta
            JOIN tag_master tm ON tm.id = ta.tag_id
            WHERE ta.entity_type = $1 AND ta.entity_id = ANY($2)
            "#,
        )
        .bind(TaggedEntity::Event.as_str())
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Failed to load event tags, continuing without tags");
                return HashMap::new();
            }
        };

        let mut tags: HashMap<String, Vec<Tag>> = HashMap::new();
        for row in rows {
            let Ok(id) = Uuid::parse_str(&row.tag_id) else {
                debug!(tag_id = %row.tag_id, "Skipping tag with malformed id");
                continue;
            };
            tags.entry(row.entity_id).or_default().push(Tag {
                id,
                name: row.tag_name,
            });
        }
        tags
    }
}

/// Events store a single free-text `message`. Its first non-blank line
/// serves as the title and the remaining lines as the description.
fn split_event_message(message: &str) -> (String, String) {
    let message = message.trim();
    match message.split_once('\n') {
        Some((title, rest)) => (title.trim().to_string(), rest.trim().to_string()),
        None => (message.to_string(), String::new()),
    }
}

#[derive(sqlx::FromRow)]
struct OwnPostRow {
    title: Option<String>,
    message: Option<String>,
    published_at: Option<NaiveDateTime>,
}

#[derive(sqlx::FromRow)]
struct LikedPostRow {
    title: Option<String>,
    message: Option<String>,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    message: String,
    current_persons: Option<i32>,
    published_at: Option<NaiveDateTime>,
    like_count: i64,
}

#[derive(sqlx::FromRow)]
struct EventTagRow {
    entity_id: String,
    tag_id: String,
    tag_name: String,
}

#[async_trait]
impl RecommendationDataSource for PgRecommendationDataSource {
    async fn get_recent_own_posts(&self, user_id: Uuid, limit: i64) -> Result<Vec<OwnPost>> {
        let rows = sqlx::query_as::<_, OwnPostRow>(
            r#"
            SELECT title, message, published_at
            FROM thread
            WHERE author_id = $1
            ORDER BY published_at DESC NULLS LAST
            LIMIT $2
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch authored threads")?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let published_at = self.to_utc(row.published_at?);
                Some(OwnPost {
                    title: row.title.unwrap_or_default(),
                    body: row.message.unwrap_or_default(),
                    published_at,
                })
            })
            .collect())
    }

    async fn get_liked_posts(&self, user_id: Uuid, limit: i64) -> Result<Vec<LikedPost>> {
        let rows = sqlx::query_as::<_, LikedPostRow>(
            r#"
            SELECT t.title, t.message
            FROM thread t
            JOIN user_heart_thread uht ON uht.thread_id = t.id
            WHERE uht.user_id = $1
            ORDER BY t.published_at DESC NULLS LAST
            LIMIT $2
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch liked threads")?;

        Ok(rows
            .into_iter()
            .map(|row| LikedPost {
                title: row.title.unwrap_or_default(),
                body: row.message.unwrap_or_default(),
            })
            .collect())
    }

    async fn get_active_candidate_events(&self) -> Result<Vec<CandidateEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT
                e.id, e.message, e.current_persons, e.published_at,
                COALESCE(h.heart_count, 0) AS like_count
            FROM event e
            LEFT JOIN (
                SELECT event_id, COUNT(user_id) AS heart_count
                FROM user_heart_event
                GROUP BY event_id
            ) h ON h.event_id = e.id
            WHERE e.is_deleted IS NOT TRUE AND e.status IS DISTINCT FROM 'ended'
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch active events")?;

        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let mut tags = self.event_tags(&ids).await;

        let events: Vec<CandidateEvent> = rows
            .into_iter()
            .filter_map(|row| {
                let Ok(event_id) = Uuid::parse_str(&row.id) else {
                    warn!(event_id = %row.id, "Skipping event with malformed id");
                    return None;
                };
                let (title, description) = split_event_message(&row.message);
                Some(CandidateEvent {
                    event_id,
                    tags: tags.remove(&row.id).unwrap_or_default(),
                    title,
                    description,
                    like_count: row.like_count,
                    participant_count: row.current_persons.map(i64::from).unwrap_or(0),
                    published_at: row.published_at.map(|t| self.to_utc(t)),
                })
            })
            .collect();

        debug!(count = events.len(), "Loaded active candidate events");
        Ok(events)
    }

    async fn get_user_interacted_event_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT event_id FROM user_member_group WHERE user_id = $1
            UNION
            SELECT event_id FROM user_heart_event WHERE user_id = $1
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch interacted events")?;

        Ok(ids
            .iter()
            .filter_map(|id| Uuid::parse_str(id).ok())
            .collect())
    }

    async fn get_user_declared_tags(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT tag_id
            FROM tag_association
            WHERE entity_type = $1 AND entity_id = $2
            "#,
        )
        .bind(TaggedEntity::User.as_str())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch declared tags")?;

        Ok(ids
            .iter()
            .filter_map(|id| Uuid::parse_str(id).ok())
            .collect())
    }
}
