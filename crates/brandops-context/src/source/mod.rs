mod memory;
mod postgres;

use async_trait::async_trait;
use brandops_core::{BrandAsset, BrandPlaybook, Persona};
use uuid::Uuid;

use crate::ContextError;

pub use memory::MemoryBrandContextSource;
pub use postgres::PgBrandContextSource;

/// Where brand playbooks, personas, and assets are read from.
#[async_trait]
pub trait BrandContextSource: Send + Sync {
    /// The single active, highest-version playbook, or `None` if the brand
    /// has none.
    async fn load_playbook(&self, brand_id: Uuid) -> Result<Option<BrandPlaybook>, ContextError>;

    /// Active personas ordered by ascending priority.
    async fn load_personas(&self, brand_id: Uuid) -> Result<Vec<Persona>, ContextError>;

    async fn load_assets(&self, brand_id: Uuid) -> Result<Vec<BrandAsset>, ContextError>;
}
