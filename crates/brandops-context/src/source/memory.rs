use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use brandops_core::{BrandAsset, BrandPlaybook, Persona};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::BrandContextSource;
use crate::ContextError;

/// In-process brand data, used by tests and offline tooling.
///
/// Can be switched to fail every call, or to delay every playbook read, to
/// exercise fallback and timeout handling.
#[derive(Debug, Default)]
pub struct MemoryBrandContextSource {
    playbooks: RwLock<HashMap<Uuid, BrandPlaybook>>,
    personas: RwLock<HashMap<Uuid, Vec<Persona>>>,
    assets: RwLock<HashMap<Uuid, Vec<BrandAsset>>>,
    unavailable: AtomicBool,
    delay_ms: AtomicU64,
    playbook_loads: AtomicU64,
}

impl MemoryBrandContextSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `playbook` as the active playbook for its brand.
    pub async fn put_playbook(&self, playbook: BrandPlaybook) {
        self.playbooks
            .write()
            .await
            .insert(playbook.brand_id, playbook);
    }

    pub async fn put_personas(&self, brand_id: Uuid, mut personas: Vec<Persona>) {
        personas.sort_by_key(|p| p.priority);
        self.personas.write().await.insert(brand_id, personas);
    }

    pub async fn put_assets(&self, brand_id: Uuid, assets: Vec<BrandAsset>) {
        self.assets.write().await.insert(brand_id, assets);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(
            u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            Ordering::SeqCst,
        );
    }

    /// Number of playbook reads served so far.
    #[must_use]
    pub fn playbook_loads(&self) -> u64 {
        self.playbook_loads.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), ContextError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(ContextError::Unavailable("memory source offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BrandContextSource for MemoryBrandContextSource {
    async fn load_playbook(&self, brand_id: Uuid) -> Result<Option<BrandPlaybook>, ContextError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check_available()?;
        self.playbook_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.playbooks.read().await.get(&brand_id).cloned())
    }

    async fn load_personas(&self, brand_id: Uuid) -> Result<Vec<Persona>, ContextError> {
        self.check_available()?;
        Ok(self
            .personas
            .read()
            .await
            .get(&brand_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn load_assets(&self, brand_id: Uuid) -> Result<Vec<BrandAsset>, ContextError> {
        self.check_available()?;
        Ok(self
            .assets
            .read()
            .await
            .get(&brand_id)
            .cloned()
            .unwrap_or_default())
    }
}
