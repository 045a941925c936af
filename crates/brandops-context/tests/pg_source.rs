//! `BrandContextService` over `PgBrandContextSource` against a fresh
//! migrated database.

use std::sync::Arc;

use brandops_context::{
    BrandContextConfig, BrandContextService, ContextError, PgBrandContextSource,
    DEFAULT_PERSONA_NAME,
};
use uuid::Uuid;

async fn insert_playbook(pool: &sqlx::PgPool, brand_id: Uuid, version: i32) {
    let playbook_id = Uuid::new_v4();
    sqlx::query("INSERT INTO brand_playbooks (id, brand_id, version) VALUES ($1, $2, $3)")
        .bind(playbook_id)
        .bind(brand_id)
        .bind(version)
        .execute(pool)
        .await
        .expect("insert brand_playbooks failed");
    sqlx::query("INSERT INTO playbook_brand_identity (playbook_id, name) VALUES ($1, 'Trailhead')")
        .bind(playbook_id)
        .execute(pool)
        .await
        .expect("insert playbook_brand_identity failed");
    sqlx::query(
        "INSERT INTO playbook_voice_tone (playbook_id, primary_tone) VALUES ($1, 'encouraging')",
    )
    .bind(playbook_id)
    .execute(pool)
    .await
    .expect("insert playbook_voice_tone failed");
}

fn service(pool: sqlx::PgPool) -> Arc<BrandContextService> {
    BrandContextService::new(
        BrandContextConfig::default(),
        Arc::new(PgBrandContextSource::new(pool)),
        None,
    )
}

#[sqlx::test(migrations = "../../migrations")]
async fn loads_latest_playbook_with_default_persona(pool: sqlx::PgPool) {
    let brand_id = Uuid::new_v4();
    insert_playbook(&pool, brand_id, 1).await;
    insert_playbook(&pool, brand_id, 2).await;

    let contexts = service(pool);
    let context = contexts
        .load_brand_context(brand_id)
        .await
        .expect("load brand context");

    assert_eq!(context.playbook.version, 2);
    assert_eq!(context.playbook.voice_and_tone.primary_tone, "encouraging");
    assert_eq!(context.personas.len(), 1);
    assert_eq!(context.personas[0].name, DEFAULT_PERSONA_NAME);
    assert!(context.assets.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn configured_personas_replace_the_default(pool: sqlx::PgPool) {
    let brand_id = Uuid::new_v4();
    insert_playbook(&pool, brand_id, 1).await;
    sqlx::query("INSERT INTO personas (id, brand_id, name, priority) VALUES ($1, $2, 'Hiker', 1)")
        .bind(Uuid::new_v4())
        .bind(brand_id)
        .execute(&pool)
        .await
        .expect("insert persona failed");

    let context = service(pool)
        .load_brand_context(brand_id)
        .await
        .expect("load brand context");
    assert_eq!(context.personas.len(), 1);
    assert_eq!(context.personas[0].name, "Hiker");
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_brand_reports_missing_playbook(pool: sqlx::PgPool) {
    let err = service(pool)
        .load_brand_context(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ContextError::PlaybookNotFound(_)));
}
