use async_trait::async_trait;
use brandops_core::{BrandAsset, BrandPlaybook, Persona};
use sqlx::PgPool;
use uuid::Uuid;

use super::BrandContextSource;
use crate::ContextError;

#[derive(Debug, Clone)]
pub struct PgBrandContextSource {
    pool: PgPool,
}

impl PgBrandContextSource {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BrandContextSource for PgBrandContextSource {
    async fn load_playbook(&self, brand_id: Uuid) -> Result<Option<BrandPlaybook>, ContextError> {
        Ok(brandops_db::get_active_playbook(&self.pool, brand_id).await?)
    }

    async fn load_personas(&self, brand_id: Uuid) -> Result<Vec<Persona>, ContextError> {
        Ok(brandops_db::list_active_personas(&self.pool, brand_id).await?)
    }

    async fn load_assets(&self, brand_id: Uuid) -> Result<Vec<BrandAsset>, ContextError> {
        Ok(brandops_db::list_brand_assets(&self.pool, brand_id).await?)
    }
}
