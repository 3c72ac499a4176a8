// Utility functions for event-recommender

use chrono::{DateTime, Utc};

/// Weight used for timestamps later than "now"
pub const FUTURE_POST_WEIGHT: f64 = 0.01;

/// Exponential recency weight: `exp(-lambda * hours_elapsed)`.
///
/// Posts dated after `now` get [`FUTURE_POST_WEIGHT`].
pub fn decay(event_time: DateTime<Utc>, now: DateTime<Utc>, lambda: f64) -> f64 {
    RecencyDecay::new(lambda).weight(event_time, now)
}

/// Recency weighting with a configurable floor for future timestamps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyDecay {
    /// Decay rate per hour
    pub lambda: f64,
    pub future_weight: f64,
}

impl RecencyDecay {
    pub fn new(lambda: f64) -> Self {
        Self {
            lambda,
            future_weight: FUTURE_POST_WEIGHT,
        }
    }

    pub fn with_future_weight(lambda: f64, future_weight: f64) -> Self {
        Self {
            lambda,
            future_weight,
        }
    }

    pub fn weight(&self, event_time: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let hours_elapsed = hours_between(event_time, now);
        if hours_elapsed < 0.0 {
            return self.future_weight;
        }

        (-self.lambda * hours_elapsed).exp()
    }

    /// Hours until the weight halves: ln(2) / lambda
    pub fn half_life_hours(&self) -> f64 {
        2.0_f64.ln() / self.lambda
    }
}

/// Signed hours from `from` to `to`, with sub-second precision
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let elapsed = to - from;
    match elapsed.num_microseconds() {
        Some(micros) => micros as f64 / 3_600_000_000.0,
        None => elapsed.num_seconds() as f64 / 3600.0,
    }
}

/// Clamp a similarity score into [0, 1], mapping NaN to 0
pub fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
