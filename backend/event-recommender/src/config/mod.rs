use serde::Deserialize;
use std::time::Duration;

use crate::services::text::PosTag;
use crate::services::vector_space::RefitPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub recommender: RecommenderConfig,
    pub database: DatabaseConfig,
}

/// Tunables for the recommendation engine (`RECOMMENDER_*` variables).
#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderConfig {
    /// Decay rate per hour applied to authored posts
    #[serde(default = "default_lambda_decay")]
    pub lambda_decay: f64,
    /// Share of the authored-post profile in the blended profile
    #[serde(default = "default_alpha_profile_weight")]
    pub alpha_profile_weight: f64,
    #[serde(default = "default_num_recommendations")]
    pub num_recommendations: usize,
    #[serde(default = "default_tfidf_max_features")]
    pub tfidf_max_features: usize,
    #[serde(default = "default_own_posts_limit")]
    pub own_posts_limit: i64,
    #[serde(default = "default_liked_posts_limit")]
    pub liked_posts_limit: i64,
    /// Weight given to posts stamped in the future (clock skew)
    #[serde(default = "default_future_post_weight")]
    pub future_post_weight: f64,
    /// 0 refits the vocabulary on every request
    #[serde(default = "default_vocabulary_refit_interval_secs")]
    pub vocabulary_refit_interval_secs: u64,
    #[serde(default)]
    pub vocabulary_refit_after_requests: Option<u64>,
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
    #[serde(default = "default_allowed_pos")]
    pub allowed_pos: Vec<String>,
}

/// PostgreSQL connection settings (`DATABASE_*` variables).
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Offset applied to timestamps stored without a zone
    #[serde(default = "default_naive_utc_offset_hours")]
    pub naive_utc_offset_hours: i32,
}

fn default_lambda_decay() -> f64 {
    0.01
}

fn default_alpha_profile_weight() -> f64 {
    0.7
}

fn default_num_recommendations() -> usize {
    5
}

fn default_tfidf_max_features() -> usize {
    5000
}

fn default_own_posts_limit() -> i64 {
    100
}

fn default_liked_posts_limit() -> i64 {
    50
}

fn default_future_post_weight() -> f64 {
    0.01
}

fn default_vocabulary_refit_interval_secs() -> u64 {
    3600
}

fn default_allowed_pos() -> Vec<String> {
    ["noun", "verb", "adjective", "adverb"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_database_url() -> String {
    "postgres://localhost:5432/platform".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_naive_utc_offset_hours() -> i32 {
    9
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            lambda_decay: default_lambda_decay(),
            alpha_profile_weight: default_alpha_profile_weight(),
            num_recommendations: default_num_recommendations(),
            tfidf_max_features: default_tfidf_max_features(),
            own_posts_limit: default_own_posts_limit(),
            liked_posts_limit: default_liked_posts_limit(),
            future_post_weight: default_future_post_weight(),
            vocabulary_refit_interval_secs: default_vocabulary_refit_interval_secs(),
            vocabulary_refit_after_requests: None,
            extra_stopwords: Vec::new(),
            allowed_pos: default_allowed_pos(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            naive_utc_offset_hours: default_naive_utc_offset_hours(),
        }
    }
}

impl RecommenderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.alpha_profile_weight) {
            return Err(format!(
                "alpha_profile_weight must be in [0, 1], got {}",
                self.alpha_profile_weight
            ));
        }

        if self.lambda_decay <= 0.0 || !self.lambda_decay.is_finite() {
            return Err(format!(
                "lambda_decay must be positive, got {}",
                self.lambda_decay
            ));
        }

        if self.future_post_weight <= 0.0 || self.future_post_weight > 1.0 {
            return Err(format!(
                "future_post_weight must be in (0, 1], got {}",
                self.future_post_weight
            ));
        }

        if self.own_posts_limit < 0 || self.liked_posts_limit < 0 {
            return Err(format!(
                "post limits must not be negative, got own_posts_limit={} liked_posts_limit={}",
                self.own_posts_limit, self.liked_posts_limit
            ));
        }

        if self.tfidf_max_features == 0 {
            return Err("tfidf_max_features must be greater than zero".to_string());
        }

        self.parsed_allowed_pos()?;

        Ok(())
    }

    /// Parts of speech kept by the tokenizer
    pub fn parsed_allowed_pos(&self) -> Result<Vec<PosTag>, String> {
        self.allowed_pos.iter().map(|s| s.parse::<PosTag>()).collect()
    }

    pub fn refit_policy(&self) -> RefitPolicy {
        if self.vocabulary_refit_interval_secs == 0 {
            return RefitPolicy::EveryRequest;
        }

        RefitPolicy::Periodic {
            max_age: Some(Duration::from_secs(self.vocabulary_refit_interval_secs)),
            max_requests: self.vocabulary_refit_after_requests,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();

        let recommender = envy::prefixed("RECOMMENDER_").from_env::<RecommenderConfig>()?;
        recommender.validate().map_err(envy::Error::Custom)?;

        let database = envy::prefixed("DATABASE_").from_env::<DatabaseConfig>()?;

        Ok(Config {
            recommender,
            database,
        })
    }
}
