use sqlx::{PgConnection, PgPool};
use ufc_core::scoring::precisao;
use ufc_core::RankingPrevisor;

pub async fn top(pool: &PgPool, limit: i64) -> Result<Vec<RankingPrevisor>, sqlx::Error> {
    sqlx::query_as::<_, RankingPrevisor>(
        r#"
        SELECT *
          FROM ranking_previsores
         WHERE total_previsoes > 0
         ORDER BY pontos DESC, precisao DESC, fingerprint ASC
         LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct Totais {
    fingerprint: String,
    pontos: i64,
    total: i64,
    acertos: i64,
}

/// Rebuilds the ranking rows for the given fingerprints from their scored
/// predictions; a fingerprint left with no scored prediction loses its row.
/// Returns how many rows were written or removed.
pub async fn refresh(conn: &mut PgConnection, fingerprints: &[String]) -> Result<u64, sqlx::Error> {
    if fingerprints.is_empty() {
        return Ok(0);
    }
    let totais = sqlx::query_as::<_, Totais>(
        r#"
        SELECT fingerprint,
               COALESCE(SUM(pontos), 0)::BIGINT AS pontos,
               COUNT(*) AS total,
               COUNT(*) FILTER (WHERE acertou) AS acertos
          FROM previsoes
         WHERE fingerprint = ANY($1)
           AND pontos IS NOT NULL
         GROUP BY fingerprint
        "#,
    )
    .bind(fingerprints)
    .fetch_all(&mut *conn)
    .await?;
    let removed = sqlx::query(
        r#"
        DELETE FROM ranking_previsores r
         WHERE r.fingerprint = ANY($1)
           AND NOT EXISTS (
               SELECT 1 FROM previsoes p
                WHERE p.fingerprint = r.fingerprint AND p.pontos IS NOT NULL
           )
        "#,
    )
    .bind(fingerprints)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    Ok(removed + write_rows(conn, &totais).await?)
}

pub async fn recompute_all(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let totais = sqlx::query_as::<_, Totais>(
        r#"
        SELECT fingerprint,
               COALESCE(SUM(pontos), 0)::BIGINT AS pontos,
               COUNT(*) AS total,
               COUNT(*) FILTER (WHERE acertou) AS acertos
          FROM previsoes
         WHERE pontos IS NOT NULL
         GROUP BY fingerprint
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM ranking_previsores")
        .execute(&mut *conn)
        .await?;
    write_rows(conn, &totais).await
}

async fn write_rows(conn: &mut PgConnection, totais: &[Totais]) -> Result<u64, sqlx::Error> {
    let mut written = 0;
    for row in totais {
        written += sqlx::query(
            r#"
            INSERT INTO ranking_previsores (fingerprint, pontos, total_previsoes, acertos, precisao, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (fingerprint) DO UPDATE
               SET pontos = EXCLUDED.pontos,
                   total_previsoes = EXCLUDED.total_previsoes,
                   acertos = EXCLUDED.acertos,
                   precisao = EXCLUDED.precisao,
                   updated_at = NOW()
            "#,
        )
        .bind(&row.fingerprint)
        .bind(row.pontos)
        .bind(row.total)
        .bind(row.acertos)
        .bind(precisao(row.acertos, row.total))
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }
    Ok(written)
}
