use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use ufc_core::Previsao;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NovaPrevisao {
    pub luta_id: Uuid,
    pub fingerprint: String,
    pub vencedor_previsto_id: Uuid,
    pub metodo_previsto: Option<String>,
    pub round_previsto: Option<i32>,
}

pub async fn list_by_fingerprint(pool: &PgPool, fingerprint: &str) -> Result<Vec<Previsao>, sqlx::Error> {
    sqlx::query_as::<_, Previsao>(
        "SELECT * FROM previsoes WHERE fingerprint = $1 ORDER BY created_at DESC",
    )
    .bind(fingerprint)
    .fetch_all(pool)
    .await
}

pub async fn list_by_luta(conn: &mut PgConnection, luta_id: Uuid) -> Result<Vec<Previsao>, sqlx::Error> {
    sqlx::query_as::<_, Previsao>("SELECT * FROM previsoes WHERE luta_id = $1")
        .bind(luta_id)
        .fetch_all(conn)
        .await
}

/// One prediction per fight and fingerprint; resubmitting replaces the pick.
pub async fn upsert(pool: &PgPool, nova: &NovaPrevisao) -> Result<Previsao, sqlx::Error> {
    sqlx::query_as::<_, Previsao>(
        r#"
        INSERT INTO previsoes (id, luta_id, fingerprint, vencedor_previsto_id, metodo_previsto, round_previsto)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (luta_id, fingerprint) DO UPDATE
           SET vencedor_previsto_id = EXCLUDED.vencedor_previsto_id,
               metodo_previsto = EXCLUDED.metodo_previsto,
               round_previsto = EXCLUDED.round_previsto,
               updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(nova.luta_id)
    .bind(&nova.fingerprint)
    .bind(nova.vencedor_previsto_id)
    .bind(&nova.metodo_previsto)
    .bind(nova.round_previsto)
    .fetch_one(pool)
    .await
}

pub async fn set_score(
    conn: &mut PgConnection,
    id: Uuid,
    pontos: i32,
    acertou: bool,
) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        "UPDATE previsoes SET pontos = $2, acertou = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(pontos)
    .bind(acertou)
    .execute(conn)
    .await?;
    Ok(done.rows_affected())
}
