//! Content-based event recommendation.
//!
//! Ranks active events by TF-IDF cosine similarity to a profile built from a
//! user's authored and liked posts, falling back to popularity, tag match and
//! recency when the content signal is missing.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{Config, RecommenderConfig};
pub use db::{InMemoryDataSource, PgRecommendationDataSource, RecommendationDataSource};
pub use error::{DataStage, RecommendError, Result};
pub use models::{RecommendationReason, RecommendationRecord};
pub use services::EventRecommender;
