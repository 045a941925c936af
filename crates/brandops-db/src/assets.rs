//! Database operations for the `brand_assets` table.

use brandops_core::BrandAsset;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `brand_assets` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandAssetRow {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub asset_type: String,
    pub url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BrandAssetRow> for BrandAsset {
    fn from(row: BrandAssetRow) -> Self {
        BrandAsset {
            id: row.id,
            asset_type: row.asset_type,
            url: row.url,
            description: row.description,
        }
    }
}

/// Returns active assets for `brand_id`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brand_assets(pool: &PgPool, brand_id: Uuid) -> Result<Vec<BrandAsset>, DbError> {
    let rows = sqlx::query_as::<_, BrandAssetRow>(
        "SELECT id, brand_id, asset_type, url, description, created_at \
         FROM brand_assets \
         WHERE brand_id = $1 AND is_active = true \
         ORDER BY created_at, id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(BrandAsset::from).collect())
}
