use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use brandops_audit::AuditService;
use brandops_core::{AppConfig, BrandContext};
use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::fallback::default_persona;
use crate::metrics::{BrandContextMetrics, Counters};
use crate::source::BrandContextSource;
use crate::ContextError;

/// Minimum number of backing loads before the failure ratio can escalate.
pub const ESCALATION_MIN_ATTEMPTS: u64 = 10;

#[derive(Debug, Clone)]
pub struct BrandContextConfig {
    pub ttl: Duration,
    pub max_size: usize,
    pub refresh_interval: Duration,
    /// Serve an expired entry when its reload fails.
    pub fallback_to_cache: bool,
    pub escalation_threshold: f64,
    pub load_timeout: Duration,
}

impl Default for BrandContextConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(300_000),
            max_size: 500,
            refresh_interval: Duration::from_millis(60_000),
            fallback_to_cache: true,
            escalation_threshold: 0.2,
            load_timeout: Duration::from_millis(10_000),
        }
    }
}

impl BrandContextConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            ttl: Duration::from_millis(config.context_ttl_ms),
            max_size: config.context_max_size.max(1),
            refresh_interval: Duration::from_millis(config.context_refresh_interval_ms.max(1)),
            fallback_to_cache: config.context_fallback_to_cache,
            escalation_threshold: config.context_escalation_threshold,
            load_timeout: Duration::from_millis(config.context_load_timeout_ms.max(1)),
        }
    }
}

/// One cached brand context. `expires_at` is always `loaded_at + ttl`.
#[derive(Debug, Clone)]
pub struct CachedBrandContext {
    pub context: Arc<BrandContext>,
    pub loaded_at: Instant,
    pub expires_at: Instant,
    /// Playbook version the context was built from.
    pub version: i32,
}

impl CachedBrandContext {
    #[must_use]
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// TTL cache of per-brand playbooks and personas.
pub struct BrandContextService {
    config: BrandContextConfig,
    source: Arc<dyn BrandContextSource>,
    audit: Option<Arc<AuditService>>,
    cache: RwLock<HashMap<Uuid, CachedBrandContext>>,
    counters: Counters,
    escalated: AtomicBool,
    refresh_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl BrandContextService {
    #[must_use]
    pub fn new(
        config: BrandContextConfig,
        source: Arc<dyn BrandContextSource>,
        audit: Option<Arc<AuditService>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            source,
            audit,
            cache: RwLock::new(HashMap::new()),
            counters: Counters::default(),
            escalated: AtomicBool::new(false),
            refresh_task: std::sync::Mutex::new(None),
        })
    }

    /// Spawns the background refresh of expired entries. Must be called
    /// inside a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.config.refresh_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(service) = weak.upgrade() else {
                    break;
                };
                let refreshed = service.refresh_expired().await;
                if refreshed > 0 {
                    tracing::debug!(refreshed, "refreshed expired brand contexts");
                }
            }
        });

        if let Ok(mut slot) = self.refresh_task.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Stops the background refresh task. Cached entries are kept.
    pub fn stop(&self) {
        let handle = self.refresh_task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    #[must_use]
    pub fn config(&self) -> &BrandContextConfig {
        &self.config
    }

    /// Returns the cached context for `brand_id`, loading it on a miss or
    /// after expiry.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the load fails and no usable cached
    /// entry remains.
    pub async fn load_brand_context(&self, brand_id: Uuid) -> Result<Arc<BrandContext>, ContextError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&brand_id) {
                if entry.is_fresh(Instant::now()) {
                    Counters::bump(&self.counters.cache_hits);
                    return Ok(Arc::clone(&entry.context));
                }
            }
        }

        Counters::bump(&self.counters.cache_misses);
        self.reload(brand_id).await
    }

    /// Reloads `brand_id` from the source regardless of cache state.
    ///
    /// # Errors
    ///
    /// Same as [`BrandContextService::load_brand_context`].
    pub async fn refresh_brand_context(
        &self,
        brand_id: Uuid,
    ) -> Result<Arc<BrandContext>, ContextError> {
        self.reload(brand_id).await
    }

    /// Loads every id concurrently. Individual failures are logged and
    /// skipped; returns how many contexts are now available.
    pub async fn preload_brand_contexts(&self, brand_ids: &[Uuid]) -> usize {
        let results = join_all(brand_ids.iter().map(|&id| self.load_brand_context(id))).await;
        results
            .into_iter()
            .zip(brand_ids)
            .filter(|(result, brand_id)| match result {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(brand_id = %brand_id, error = %e, "brand context preload failed");
                    false
                }
            })
            .count()
    }

    /// Reloads every expired entry, swallowing failures. Returns how many
    /// reloads succeeded.
    pub async fn refresh_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<Uuid> = {
            let cache = self.cache.read().await;
            cache
                .iter()
                .filter(|(_, entry)| !entry.is_fresh(now))
                .map(|(id, _)| *id)
                .collect()
        };

        let mut refreshed = 0;
        for brand_id in expired {
            if self.reload(brand_id).await.is_ok() {
                refreshed += 1;
            }
        }
        refreshed
    }

    pub async fn invalidate(&self, brand_id: Uuid) -> bool {
        self.cache.write().await.remove(&brand_id).is_some()
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn cached_entry(&self, brand_id: Uuid) -> Option<CachedBrandContext> {
        self.cache.read().await.get(&brand_id).cloned()
    }

    pub async fn metrics(&self) -> BrandContextMetrics {
        let size = self.cache_size().await;
        self.counters
            .snapshot(size, self.escalated.load(Ordering::SeqCst))
    }

    pub fn reset_metrics(&self) {
        self.counters.reset();
        self.escalated.store(false, Ordering::SeqCst);
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    async fn reload(&self, brand_id: Uuid) -> Result<Arc<BrandContext>, ContextError> {
        let started = Instant::now();
        match self.fetch(brand_id).await {
            Ok(context) => {
                Counters::bump(&self.counters.load_successes);
                Counters::bump(&self.counters.brand_contexts_loaded);
                self.check_escalation().await;

                let persona_count = context.personas.len();
                let context = self.insert(context).await;
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                tracing::debug!(
                    brand_id = %brand_id,
                    version = context.playbook.version,
                    persona_count,
                    elapsed_ms,
                    "brand context loaded"
                );
                if let Some(audit) = &self.audit {
                    if let Err(e) = audit
                        .log_brand_context_loaded(brand_id, elapsed_ms, false, persona_count)
                        .await
                    {
                        tracing::warn!(error = %e, "failed to audit brand context load");
                    }
                }
                Ok(context)
            }
            Err(error) => self.handle_failure(brand_id, error).await,
        }
    }

    async fn fetch(&self, brand_id: Uuid) -> Result<BrandContext, ContextError> {
        let load = async {
            tokio::try_join!(
                self.source.load_playbook(brand_id),
                self.source.load_personas(brand_id),
                self.source.load_assets(brand_id),
            )
        };
        let (playbook, personas, assets) = tokio::time::timeout(self.config.load_timeout, load)
            .await
            .map_err(|_| ContextError::Timeout {
                brand_id,
                timeout_ms: u64::try_from(self.config.load_timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        let playbook = playbook.ok_or(ContextError::PlaybookNotFound(brand_id))?;
        let personas = if personas.is_empty() {
            tracing::debug!(brand_id = %brand_id, "no personas configured; using default persona");
            vec![default_persona(brand_id)]
        } else {
            personas
        };

        Ok(BrandContext {
            brand_id,
            playbook,
            personas,
            assets,
        })
    }

    async fn insert(&self, context: BrandContext) -> Arc<BrandContext> {
        let loaded_at = Instant::now();
        let entry = CachedBrandContext {
            version: context.playbook.version,
            context: Arc::new(context),
            loaded_at,
            expires_at: loaded_at + self.config.ttl,
        };
        let shared = Arc::clone(&entry.context);

        let mut cache = self.cache.write().await;
        cache.insert(shared.brand_id, entry);
        if cache.len() > self.config.max_size {
            let mut by_age: Vec<(Uuid, Instant)> =
                cache.iter().map(|(id, e)| (*id, e.loaded_at)).collect();
            by_age.sort_by_key(|(_, loaded_at)| *loaded_at);
            let overflow = cache.len() - self.config.max_size;
            for (id, _) in by_age.into_iter().take(overflow) {
                cache.remove(&id);
            }
            tracing::debug!(evicted = overflow, "evicted oldest brand contexts");
        }
        shared
    }

    async fn handle_failure(
        &self,
        brand_id: Uuid,
        error: ContextError,
    ) -> Result<Arc<BrandContext>, ContextError> {
        Counters::bump(&self.counters.load_failures);

        let stale = if self.config.fallback_to_cache {
            self.cache
                .read()
                .await
                .get(&brand_id)
                .map(|entry| Arc::clone(&entry.context))
        } else {
            self.cache.write().await.remove(&brand_id);
            None
        };

        tracing::warn!(
            brand_id = %brand_id,
            error = %error,
            served_stale = stale.is_some(),
            "brand context load failed"
        );
        if let Some(audit) = &self.audit {
            if let Err(e) = audit
                .log_brand_context_failed(brand_id, &error.to_string(), stale.is_some())
                .await
            {
                tracing::warn!(error = %e, "failed to audit brand context failure");
            }
        }
        self.check_escalation().await;

        stale.ok_or(error)
    }

    /// Fires once when the failure ratio first exceeds the threshold and
    /// re-arms once it drops back.
    async fn check_escalation(&self) {
        let attempts = self.counters.attempts();
        let ratio = self.counters.failure_ratio();
        let threshold = self.config.escalation_threshold;

        if ratio <= threshold {
            self.escalated.store(false, Ordering::SeqCst);
            return;
        }
        if attempts < ESCALATION_MIN_ATTEMPTS || self.escalated.swap(true, Ordering::SeqCst) {
            return;
        }

        Counters::bump(&self.counters.escalations);
        tracing::error!(
            failure_ratio = ratio,
            attempts,
            threshold,
            "brand context failure ratio above escalation threshold"
        );
        if let Some(audit) = &self.audit {
            if let Err(e) = audit
                .log_brand_context_escalation(ratio, attempts, threshold)
                .await
            {
                tracing::warn!(error = %e, "failed to audit brand context escalation");
            }
        }
    }
}

impl Drop for BrandContextService {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.refresh_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
