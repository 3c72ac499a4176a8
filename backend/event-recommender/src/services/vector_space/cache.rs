use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info};

use super::VocabularyModel;

/// When a cached vocabulary must be refitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefitPolicy {
    /// Fit a fresh vocabulary for every request
    EveryRequest,
    /// Reuse until older than `max_age` or after `max_requests` uses.
    /// Both `None` keeps the first fit for the life of the cache.
    Periodic {
        max_age: Option<Duration>,
        max_requests: Option<u64>,
    },
}

impl Default for RefitPolicy {
    fn default() -> Self {
        RefitPolicy::Periodic {
            max_age: None,
            max_requests: None,
        }
    }
}

/// A fitted model plus the bookkeeping the refit policy needs
#[derive(Debug)]
pub struct FittedVocabulary {
    model: VocabularyModel,
    fitted_at: DateTime<Utc>,
    requests_served: AtomicU64,
}

impl FittedVocabulary {
    fn new(model: VocabularyModel, fitted_at: DateTime<Utc>) -> Self {
        Self {
            model,
            fitted_at,
            requests_served: AtomicU64::new(1),
        }
    }

    pub fn model(&self) -> &VocabularyModel {
        &self.model
    }

    pub fn fitted_at(&self) -> DateTime<Utc> {
        self.fitted_at
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }
}

/// Process-wide vocabulary shared across requests.
///
/// Fitting runs without holding the lock; the finished model is published
/// with a single swap, so readers never see a partial model. Concurrent
/// refits race and the last writer wins.
#[derive(Debug)]
pub struct VocabularyCache {
    slot: RwLock<Option<Arc<FittedVocabulary>>>,
    policy: RefitPolicy,
    max_features: usize,
}

impl VocabularyCache {
    pub fn new(policy: RefitPolicy, max_features: usize) -> Self {
        Self {
            slot: RwLock::new(None),
            policy,
            max_features,
        }
    }

    pub fn policy(&self) -> RefitPolicy {
        self.policy
    }

    /// Currently published vocabulary, if any
    pub fn current(&self) -> Option<Arc<FittedVocabulary>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cached vocabulary when still fresh, otherwise fit `corpus()` and
    /// publish the result. Empty models are returned but never published.
    pub fn get_or_fit<F>(&self, now: DateTime<Utc>, corpus: F) -> Arc<FittedVocabulary>
    where
        F: FnOnce() -> Vec<Vec<String>>,
    {
        if let Some(current) = self.current() {
            if !self.is_stale(&current, now) {
                current.requests_served.fetch_add(1, Ordering::Relaxed);
                return current;
            }
            debug!(
                fitted_at = %current.fitted_at,
                requests_served = current.requests_served(),
                "Cached vocabulary is stale, refitting"
            );
        }

        let corpus = corpus();
        let fitted = Arc::new(FittedVocabulary::new(
            VocabularyModel::fit(&corpus, self.max_features),
            now,
        ));

        if fitted.model.is_empty() || self.policy == RefitPolicy::EveryRequest {
            return fitted;
        }

        info!(
            documents = corpus.len(),
            vocabulary_size = fitted.model.len(),
            "Publishing fitted vocabulary"
        );
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&fitted));

        fitted
    }

    /// Drop the cached model; the next request refits
    pub fn invalidate(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn is_stale(&self, fitted: &FittedVocabulary, now: DateTime<Utc>) -> bool {
        match self.policy {
            RefitPolicy::EveryRequest => true,
            RefitPolicy::Periodic {
                max_age,
                max_requests,
            } => {
                let expired = max_age.is_some_and(|max_age| {
                    (now - fitted.fitted_at)
                        .to_std()
                        .map(|age| age >= max_age)
                        .unwrap_or(false)
                });
                let exhausted =
                    max_requests.is_some_and(|max| fitted.requests_served() >= max);
                expired || exhausted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::AtomicUsize;

    fn corpus(words: &[&str]) -> Vec<Vec<String>> {
        vec![words.iter().map(|w| w.to_string()).collect()]
    }

    #[test]
    fn test_fits_once_and_reuses() {
        let cache = VocabularyCache::new(RefitPolicy::default(), 100);
        let fits = AtomicUsize::new(0);
        let now = Utc::now();

        let first = cache.get_or_fit(now, || {
            fits.fetch_add(1, Ordering::SeqCst);
            corpus(&["自然", "登山"])
        });
        let second = cache.get_or_fit(now + ChronoDuration::days(30), || {
            fits.fetch_add(1, Ordering::SeqCst);
            corpus(&["カフェ"])
        });

        assert_eq!(fits.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.requests_served(), 2);
    }

    #[test]
    fn test_refits_after_max_age() {
        let policy = RefitPolicy::Periodic {
            max_age: Some(Duration::from_secs(3600)),
            max_requests: None,
        };
        let cache = VocabularyCache::new(policy, 100);
        let now = Utc::now();

        cache.get_or_fit(now, || corpus(&["自然"]));
        let fresh = cache.get_or_fit(now + ChronoDuration::minutes(30), || corpus(&["カフェ"]));
        assert!(fresh.model().contains("自然"));

        let refit = cache.get_or_fit(now + ChronoDuration::hours(2), || corpus(&["カフェ"]));
        assert!(refit.model().contains("カフェ"));
        assert!(!refit.model().contains("自然"));
    }

    #[test]
    fn test_refits_after_max_requests() {
        let policy = RefitPolicy::Periodic {
            max_age: None,
            max_requests: Some(2),
        };
        let cache = VocabularyCache::new(policy, 100);
        let now = Utc::now();

        cache.get_or_fit(now, || corpus(&["自然"]));
        cache.get_or_fit(now, || corpus(&["カフェ"]));
        let third = cache.get_or_fit(now, || corpus(&["カフェ"]));
        assert!(third.model().contains("カフェ"));
    }

    #[test]
    fn test_every_request_never_publishes() {
        let cache = VocabularyCache::new(RefitPolicy::EveryRequest, 100);
        let model = cache.get_or_fit(Utc::now(), || corpus(&["自然"]));
        assert!(model.model().contains("自然"));
        assert!(cache.current().is_none());
    }

    #[test]
    fn test_empty_model_not_published() {
        let cache = VocabularyCache::new(RefitPolicy::default(), 100);
        let model = cache.get_or_fit(Utc::now(), Vec::new);
        assert!(model.model().is_empty());
        assert!(cache.current().is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache = VocabularyCache::new(RefitPolicy::default(), 100);
        cache.get_or_fit(Utc::now(), || corpus(&["自然"]));
        assert!(cache.current().is_some());

        cache.invalidate();
        assert!(cache.current().is_none());
    }

    #[test]
    fn test_concurrent_fits_publish_complete_model() {
        let cache = Arc::new(VocabularyCache::new(RefitPolicy::default(), 100));
        let now = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache
                        .get_or_fit(now, || corpus(&["自然", "登山", "カフェ"]))
                        .model()
                        .len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
        assert_eq!(cache.current().map(|v| v.model().len()), Some(3));
    }
}
