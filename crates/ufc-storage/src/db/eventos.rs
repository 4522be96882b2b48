use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use ufc_core::{Evento, EventoDraft, EventoStatus, EventoTipo, LutaCard};
use uuid::Uuid;

use super::Page;

#[derive(Debug, Clone, Default)]
pub struct EventoFiltro {
    pub status: Option<EventoStatus>,
    pub tipo: Option<EventoTipo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NovoEvento {
    pub nome: String,
    pub slug: String,
    pub ufc_slug: Option<String>,
    pub local: Option<String>,
    pub cidade: Option<String>,
    pub pais: Option<String>,
    pub data: DateTime<Utc>,
    pub status: Option<EventoStatus>,
    pub tipo: Option<EventoTipo>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub previsoes: u64,
    /// Leaderboard rows rebuilt or removed for the owners of those predictions.
    pub rankings_atualizados: u64,
    pub lutas: u64,
    pub comentarios: u64,
    pub analises_desvinculadas: u64,
    pub eventos: u64,
}

pub async fn list(pool: &PgPool, filtro: &EventoFiltro, page: Page) -> Result<Vec<Evento>, sqlx::Error> {
    sqlx::query_as::<_, Evento>(
        r#"
        SELECT *
          FROM eventos
         WHERE ($1::text IS NULL OR status = $1)
           AND ($2::text IS NULL OR tipo = $2)
         ORDER BY data DESC
         LIMIT $3 OFFSET $4
        "#,
    )
    .bind(filtro.status.map(|s| s.as_str()))
    .bind(filtro.tipo.map(|t| t.as_str()))
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}

pub async fn upcoming(pool: &PgPool, limit: i64) -> Result<Vec<Evento>, sqlx::Error> {
    sqlx::query_as::<_, Evento>(
        r#"
        SELECT *
          FROM eventos
         WHERE data >= NOW() - INTERVAL '1 day'
           AND status <> 'finalizado'
         ORDER BY data ASC
         LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Evento>, sqlx::Error> {
    sqlx::query_as::<_, Evento>("SELECT * FROM eventos ORDER BY data")
        .fetch_all(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Evento>, sqlx::Error> {
    sqlx::query_as::<_, Evento>("SELECT * FROM eventos WHERE slug = $1 OR ufc_slug = $1 LIMIT 1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn card(pool: &PgPool, evento_id: Uuid) -> Result<Vec<LutaCard>, sqlx::Error> {
    sqlx::query_as::<_, LutaCard>(
        r#"
        SELECT l.*,
               f1.nome AS lutador1_nome,
               f2.nome AS lutador2_nome
          FROM lutas l
          JOIN lutadores f1 ON f1.id = l.lutador1_id
          JOIN lutadores f2 ON f2.id = l.lutador2_id
         WHERE l.evento_id = $1
         ORDER BY l.ordem ASC
        "#,
    )
    .bind(evento_id)
    .fetch_all(pool)
    .await
}

pub async fn insert(pool: &PgPool, novo: &NovoEvento, tipo: EventoTipo) -> Result<Evento, sqlx::Error> {
    sqlx::query_as::<_, Evento>(
        r#"
        INSERT INTO eventos (id, nome, slug, ufc_slug, local, cidade, pais, data, status, tipo, poster_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&novo.nome)
    .bind(&novo.slug)
    .bind(&novo.ufc_slug)
    .bind(&novo.local)
    .bind(&novo.cidade)
    .bind(&novo.pais)
    .bind(novo.data)
    .bind(novo.status.unwrap_or(EventoStatus::Agendado).as_str())
    .bind(tipo.as_str())
    .bind(&novo.poster_url)
    .fetch_one(pool)
    .await
}

/// Insert-or-refresh by slug. `tipo = None` keeps whatever type is stored.
pub async fn upsert_draft(
    pool: &PgPool,
    draft: &EventoDraft,
    data: DateTime<Utc>,
    tipo: Option<EventoTipo>,
) -> Result<Evento, sqlx::Error> {
    sqlx::query_as::<_, Evento>(
        r#"
        INSERT INTO eventos (id, nome, slug, ufc_slug, local, cidade, pais, data, status, tipo)
        VALUES ($1, $2, $3, $3, $4, $5, $6, $7, $8, COALESCE($9::text, 'Fight Night'))
        ON CONFLICT (slug) DO UPDATE
           SET nome = EXCLUDED.nome,
               local = COALESCE(EXCLUDED.local, eventos.local),
               cidade = COALESCE(EXCLUDED.cidade, eventos.cidade),
               pais = COALESCE(EXCLUDED.pais, eventos.pais),
               data = EXCLUDED.data,
               status = EXCLUDED.status,
               tipo = COALESCE($9::text, eventos.tipo),
               updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&draft.nome)
    .bind(&draft.slug)
    .bind(&draft.local)
    .bind(&draft.cidade)
    .bind(&draft.pais)
    .bind(data)
    .bind(draft.status.as_str())
    .bind(tipo.map(|t| t.as_str()))
    .fetch_one(pool)
    .await
}

pub async fn update_nome_tipo(
    pool: &PgPool,
    id: Uuid,
    nome: &str,
    tipo: EventoTipo,
) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        "UPDATE eventos SET nome = $2, tipo = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(nome)
    .bind(tipo.as_str())
    .execute(pool)
    .await?;
    Ok(done.rows_affected())
}

pub async fn update_text(
    pool: &PgPool,
    id: Uuid,
    nome: &str,
    local: Option<&str>,
    cidade: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        "UPDATE eventos SET nome = $2, local = $3, cidade = $4, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(nome)
    .bind(local)
    .bind(cidade)
    .execute(pool)
    .await?;
    Ok(done.rows_affected())
}

/// Removes an event and everything hanging off it, children first, so no
/// fight or prediction is ever left pointing at a missing event.
pub async fn delete_with_children(conn: &mut PgConnection, evento_id: Uuid) -> Result<DeleteSummary, sqlx::Error> {
    let mut fingerprints: Vec<String> = sqlx::query_scalar(
        "DELETE FROM previsoes WHERE luta_id IN (SELECT id FROM lutas WHERE evento_id = $1) RETURNING fingerprint",
    )
    .bind(evento_id)
    .fetch_all(&mut *conn)
    .await?;
    let previsoes = fingerprints.len() as u64;
    fingerprints.sort();
    fingerprints.dedup();
    let rankings_atualizados = super::ranking::refresh(&mut *conn, &fingerprints).await?;

    let lutas = sqlx::query("DELETE FROM lutas WHERE evento_id = $1")
        .bind(evento_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let comentarios = sqlx::query(
        "DELETE FROM comentarios WHERE conteudo_tipo = 'evento' AND conteudo_id = $1",
    )
    .bind(evento_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let analises_desvinculadas = sqlx::query(
        "UPDATE analises SET evento_id = NULL, updated_at = NOW() WHERE evento_id = $1",
    )
    .bind(evento_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let eventos = sqlx::query("DELETE FROM eventos WHERE id = $1")
        .bind(evento_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(DeleteSummary {
        previsoes,
        rankings_atualizados,
        lutas,
        comentarios,
        analises_desvinculadas,
        eventos,
    })
}
