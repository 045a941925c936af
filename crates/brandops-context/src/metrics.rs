use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub load_successes: AtomicU64,
    pub load_failures: AtomicU64,
    pub brand_contexts_loaded: AtomicU64,
    pub escalations: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    /// Successful plus failed backing loads.
    pub fn attempts(&self) -> u64 {
        Self::get(&self.load_successes) + Self::get(&self.load_failures)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn failure_ratio(&self) -> f64 {
        let attempts = self.attempts();
        if attempts == 0 {
            0.0
        } else {
            Self::get(&self.load_failures) as f64 / attempts as f64
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self, cache_size: usize, escalated: bool) -> BrandContextMetrics {
        let hits = Self::get(&self.cache_hits);
        let misses = Self::get(&self.cache_misses);
        let lookups = hits + misses;
        BrandContextMetrics {
            cache_hits: hits,
            cache_misses: misses,
            load_successes: Self::get(&self.load_successes),
            load_failures: Self::get(&self.load_failures),
            brand_contexts_loaded: Self::get(&self.brand_contexts_loaded),
            escalations: Self::get(&self.escalations),
            cache_size,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
            failure_ratio: self.failure_ratio(),
            escalated,
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.cache_hits,
            &self.cache_misses,
            &self.load_successes,
            &self.load_failures,
            &self.brand_contexts_loaded,
            &self.escalations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Point-in-time view of the cache counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandContextMetrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub load_successes: u64,
    pub load_failures: u64,
    pub brand_contexts_loaded: u64,
    pub escalations: u64,
    pub cache_size: usize,
    pub hit_rate: f64,
    pub failure_ratio: f64,
    /// True while the failure ratio is above the escalation threshold.
    pub escalated: bool,
}
