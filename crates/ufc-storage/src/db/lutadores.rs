use serde::Deserialize;
use sqlx::PgPool;
use ufc_core::{Lutador, LutadorDraft};
use uuid::Uuid;

use super::Page;

#[derive(Debug, Clone, Default)]
pub struct LutadorFiltro {
    pub categoria_peso: Option<String>,
    pub busca: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NovoLutador {
    pub nome: String,
    pub apelido: Option<String>,
    pub slug: Option<String>,
    pub categoria_peso: Option<String>,
    #[serde(default)]
    pub vitorias: i32,
    #[serde(default)]
    pub derrotas: i32,
    #[serde(default)]
    pub empates: i32,
    pub pais: Option<String>,
    pub ranking: Option<i32>,
    pub imagem_url: Option<String>,
}

pub async fn list(pool: &PgPool, filtro: &LutadorFiltro, page: Page) -> Result<Vec<Lutador>, sqlx::Error> {
    sqlx::query_as::<_, Lutador>(
        r#"
        SELECT *
          FROM lutadores
         WHERE ativo
           AND ($1::text IS NULL OR categoria_peso = $1)
           AND ($2::text IS NULL OR nome ILIKE '%' || $2 || '%' OR apelido ILIKE '%' || $2 || '%')
         ORDER BY ranking ASC NULLS LAST, nome ASC
         LIMIT $3 OFFSET $4
        "#,
    )
    .bind(filtro.categoria_peso.as_deref())
    .bind(filtro.busca.as_deref())
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Lutador>, sqlx::Error> {
    sqlx::query_as::<_, Lutador>("SELECT * FROM lutadores ORDER BY nome")
        .fetch_all(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Lutador>, sqlx::Error> {
    sqlx::query_as::<_, Lutador>("SELECT * FROM lutadores WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Lutador>, sqlx::Error> {
    sqlx::query_as::<_, Lutador>("SELECT * FROM lutadores WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &PgPool, novo: &NovoLutador, slug: &str) -> Result<Lutador, sqlx::Error> {
    sqlx::query_as::<_, Lutador>(
        r#"
        INSERT INTO lutadores (id, nome, apelido, slug, categoria_peso, vitorias, derrotas, empates, pais, ranking, imagem_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&novo.nome)
    .bind(&novo.apelido)
    .bind(slug)
    .bind(&novo.categoria_peso)
    .bind(novo.vitorias)
    .bind(novo.derrotas)
    .bind(novo.empates)
    .bind(&novo.pais)
    .bind(novo.ranking)
    .bind(&novo.imagem_url)
    .fetch_one(pool)
    .await
}

pub async fn upsert_draft(pool: &PgPool, draft: &LutadorDraft) -> Result<Lutador, sqlx::Error> {
    sqlx::query_as::<_, Lutador>(
        r#"
        INSERT INTO lutadores (id, nome, apelido, slug, categoria_peso, vitorias, derrotas, empates, pais, ranking)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (slug) DO UPDATE
           SET nome = EXCLUDED.nome,
               apelido = COALESCE(EXCLUDED.apelido, lutadores.apelido),
               categoria_peso = COALESCE(EXCLUDED.categoria_peso, lutadores.categoria_peso),
               vitorias = EXCLUDED.vitorias,
               derrotas = EXCLUDED.derrotas,
               empates = EXCLUDED.empates,
               pais = COALESCE(EXCLUDED.pais, lutadores.pais),
               ranking = EXCLUDED.ranking,
               updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&draft.nome)
    .bind(&draft.apelido)
    .bind(&draft.slug)
    .bind(&draft.categoria_peso)
    .bind(draft.vitorias)
    .bind(draft.derrotas)
    .bind(draft.empates)
    .bind(&draft.pais)
    .bind(draft.ranking)
    .fetch_one(pool)
    .await
}

pub async fn update_nome_apelido(
    pool: &PgPool,
    id: Uuid,
    nome: &str,
    apelido: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        "UPDATE lutadores SET nome = $2, apelido = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(nome)
    .bind(apelido)
    .execute(pool)
    .await?;
    Ok(done.rows_affected())
}
