//! The composite handed to every decision for a brand.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::persona::Persona;
use crate::playbook::BrandPlaybook;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandAsset {
    pub id: Uuid,
    pub asset_type: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Playbook, personas, and assets for one brand.
///
/// Only ever assembled in memory by the brand-context cache; there is no
/// table behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandContext {
    pub brand_id: Uuid,
    pub playbook: BrandPlaybook,
    pub personas: Vec<Persona>,
    #[serde(default)]
    pub assets: Vec<BrandAsset>,
}
