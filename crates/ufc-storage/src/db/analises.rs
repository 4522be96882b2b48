use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use ufc_core::Analise;
use uuid::Uuid;

use super::Page;

#[derive(Debug, Clone, Deserialize)]
pub struct NovaAnalise {
    pub slug: String,
    pub titulo: String,
    pub evento_id: Option<Uuid>,
    pub lutador1_id: Uuid,
    pub lutador2_id: Uuid,
    pub resumo: Option<String>,
    #[serde(default = "empty_object")]
    pub breakdown: JsonValue,
    #[serde(default = "empty_object")]
    pub previsao: JsonValue,
    pub autor: Option<String>,
    pub publicado_em: Option<DateTime<Utc>>,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

pub async fn list(pool: &PgPool, evento_slug: Option<&str>, page: Page) -> Result<Vec<Analise>, sqlx::Error> {
    sqlx::query_as::<_, Analise>(
        r#"
        SELECT a.*
          FROM analises a
          LEFT JOIN eventos e ON e.id = a.evento_id
         WHERE ($1::text IS NULL OR e.slug = $1 OR e.ufc_slug = $1)
         ORDER BY a.publicado_em DESC
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(evento_slug)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Analise>, sqlx::Error> {
    sqlx::query_as::<_, Analise>("SELECT * FROM analises WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// Fails with a unique violation when the slug is taken.
pub async fn insert(pool: &PgPool, nova: &NovaAnalise) -> Result<Analise, sqlx::Error> {
    sqlx::query_as::<_, Analise>(
        r#"
        INSERT INTO analises (id, slug, titulo, evento_id, lutador1_id, lutador2_id, resumo, breakdown, previsao, autor, publicado_em)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, NOW()))
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&nova.slug)
    .bind(&nova.titulo)
    .bind(nova.evento_id)
    .bind(nova.lutador1_id)
    .bind(nova.lutador2_id)
    .bind(&nova.resumo)
    .bind(&nova.breakdown)
    .bind(&nova.previsao)
    .bind(&nova.autor)
    .bind(nova.publicado_em)
    .fetch_one(pool)
    .await
}
