use std::fmt;
use thiserror::Error;

use crate::models::RecommendationRecord;

pub type Result<T> = std::result::Result<T, RecommendError>;

/// Collaborator query that failed while gathering request data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStage {
    CandidateEvents,
    OwnPosts,
    LikedPosts,
}

impl fmt::Display for DataStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataStage::CandidateEvents => "candidate events",
            DataStage::OwnPosts => "authored posts",
            DataStage::LikedPosts => "liked posts",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RecommendError {
    /// A required collaborator query failed. `fallback` holds what the
    /// fallback strategies produced from the data that did load.
    #[error("Recommendation unavailable: failed to load {stage}: {source}")]
    Unavailable {
        stage: DataStage,
        #[source]
        source: anyhow::Error,
        fallback: Vec<RecommendationRecord>,
    },
}

impl RecommendError {
    pub fn stage(&self) -> DataStage {
        match self {
            RecommendError::Unavailable { stage, .. } => *stage,
        }
    }

    /// Degraded recommendations for callers that prefer them over an error
    pub fn into_fallback(self) -> Vec<RecommendationRecord> {
        match self {
            RecommendError::Unavailable { fallback, .. } => fallback,
        }
    }
}
