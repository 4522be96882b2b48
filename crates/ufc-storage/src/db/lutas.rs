use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use ufc_core::scoring::Resultado;
use ufc_core::Luta;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NovaLuta {
    pub evento_id: Uuid,
    pub lutador1_id: Uuid,
    pub lutador2_id: Uuid,
    pub categoria_peso: Option<String>,
    #[serde(default)]
    pub ordem: i32,
    #[serde(default)]
    pub is_main_event: bool,
    #[serde(default)]
    pub is_titulo: bool,
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Luta>, sqlx::Error> {
    sqlx::query_as::<_, Luta>("SELECT * FROM lutas WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &PgPool, nova: &NovaLuta) -> Result<Luta, sqlx::Error> {
    sqlx::query_as::<_, Luta>(
        r#"
        INSERT INTO lutas (id, evento_id, lutador1_id, lutador2_id, categoria_peso, ordem, is_main_event, is_titulo)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(nova.evento_id)
    .bind(nova.lutador1_id)
    .bind(nova.lutador2_id)
    .bind(&nova.categoria_peso)
    .bind(nova.ordem)
    .bind(nova.is_main_event)
    .bind(nova.is_titulo)
    .fetch_one(pool)
    .await
}

pub async fn record_result(
    conn: &mut PgConnection,
    id: Uuid,
    resultado: &Resultado,
    tempo: Option<&str>,
) -> Result<Option<Luta>, sqlx::Error> {
    sqlx::query_as::<_, Luta>(
        r#"
        UPDATE lutas
           SET vencedor_id = $2,
               metodo = $3,
               round = $4,
               tempo = $5,
               status = 'finalizada',
               updated_at = NOW()
         WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(resultado.vencedor_id)
    .bind(&resultado.metodo)
    .bind(resultado.round)
    .bind(tempo)
    .fetch_optional(conn)
    .await
}
