//! Per-brand context cache.
//!
//! [`BrandContextService`] keeps the active playbook, personas, and assets
//! for each brand in memory with a TTL, reloads expired entries in the
//! background, serves stale data when a reload fails, and escalates when the
//! overall failure ratio stays too high.

mod error;
mod fallback;
mod metrics;
mod service;
pub mod source;

pub use error::ContextError;
pub use fallback::{default_persona, DEFAULT_PERSONA_NAME};
pub use metrics::BrandContextMetrics;
pub use service::{
    BrandContextConfig, BrandContextService, CachedBrandContext, ESCALATION_MIN_ATTEMPTS,
};
pub use source::{BrandContextSource, MemoryBrandContextSource, PgBrandContextSource};
