use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use ufc_core::{Noticia, NoticiaCategoria};
use uuid::Uuid;

use super::Page;

#[derive(Debug, Clone, Default)]
pub struct NoticiaFiltro {
    pub categoria: Option<NoticiaCategoria>,
    pub lutador_slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NovaNoticia {
    pub titulo: String,
    pub subtitulo: Option<String>,
    pub conteudo: Option<String>,
    pub imagem_url: Option<String>,
    pub fonte_url: String,
    pub fonte_nome: Option<String>,
    pub categoria: NoticiaCategoria,
    pub publicado_em: Option<DateTime<Utc>>,
}

/// Tab counts for the news page; every category is present, zero when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContagemCategorias {
    pub total: i64,
    pub categorias: BTreeMap<&'static str, i64>,
}

impl ContagemCategorias {
    pub fn from_rows(rows: &[(String, i64)]) -> Self {
        let mut categorias: BTreeMap<&'static str, i64> =
            NoticiaCategoria::ALL.iter().map(|c| (c.as_str(), 0)).collect();
        let mut total = 0;
        for (categoria, count) in rows {
            total += count;
            if let Ok(categoria) = categoria.parse::<NoticiaCategoria>() {
                *categorias.entry(categoria.as_str()).or_default() += count;
            }
        }
        Self { total, categorias }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoticiaResumo {
    pub id: Uuid,
    pub titulo: String,
    pub fonte_url: String,
    pub created_at: DateTime<Utc>,
}

pub async fn list(pool: &PgPool, filtro: &NoticiaFiltro, page: Page) -> Result<Vec<Noticia>, sqlx::Error> {
    sqlx::query_as::<_, Noticia>(
        r#"
        SELECT n.*
          FROM noticias n
         WHERE ($1::text IS NULL OR n.categoria = $1)
           AND ($2::text IS NULL OR EXISTS (
                SELECT 1
                  FROM noticia_lutadores nl
                  JOIN lutadores l ON l.id = nl.lutador_id
                 WHERE nl.noticia_id = n.id
                   AND l.slug = $2))
         ORDER BY n.publicado_em DESC
         LIMIT $3 OFFSET $4
        "#,
    )
    .bind(filtro.categoria.map(|c| c.as_str()))
    .bind(filtro.lutador_slug.as_deref())
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}

pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<Noticia>, sqlx::Error> {
    sqlx::query_as::<_, Noticia>("SELECT * FROM noticias ORDER BY publicado_em DESC LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn contagens(pool: &PgPool) -> Result<ContagemCategorias, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT categoria, COUNT(*) FROM noticias GROUP BY categoria",
    )
    .fetch_all(pool)
    .await?;
    Ok(ContagemCategorias::from_rows(&rows))
}

/// Fetches an article and counts the view in the same statement; a missing
/// id returns `None` and counts nothing.
pub async fn view(pool: &PgPool, id: Uuid) -> Result<Option<Noticia>, sqlx::Error> {
    sqlx::query_as::<_, Noticia>(
        r#"
        UPDATE noticias
           SET visualizacoes = visualizacoes + 1
         WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Which of `urls` are already stored.
pub async fn existing_urls(pool: &PgPool, urls: &[String]) -> Result<HashSet<String>, sqlx::Error> {
    if urls.is_empty() {
        return Ok(HashSet::new());
    }
    let found = sqlx::query_scalar::<_, String>("SELECT fonte_url FROM noticias WHERE fonte_url = ANY($1)")
        .bind(urls)
        .fetch_all(pool)
        .await?;
    Ok(found.into_iter().collect())
}

pub async fn titles_since(pool: &PgPool, since: DateTime<Utc>) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT titulo FROM noticias WHERE publicado_em >= $1")
        .bind(since)
        .fetch_all(pool)
        .await
}

/// `None` when an article with the same `fonte_url` already exists.
pub async fn insert_if_new(pool: &PgPool, nova: &NovaNoticia) -> Result<Option<Noticia>, sqlx::Error> {
    sqlx::query_as::<_, Noticia>(
        r#"
        INSERT INTO noticias (id, titulo, subtitulo, conteudo, imagem_url, fonte_url, fonte_nome, categoria, publicado_em)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, NOW()))
        ON CONFLICT (fonte_url) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&nova.titulo)
    .bind(&nova.subtitulo)
    .bind(&nova.conteudo)
    .bind(&nova.imagem_url)
    .bind(&nova.fonte_url)
    .bind(&nova.fonte_nome)
    .bind(nova.categoria.as_str())
    .bind(nova.publicado_em)
    .fetch_optional(pool)
    .await
}

pub async fn link_lutadores(pool: &PgPool, noticia_id: Uuid, lutador_ids: &[Uuid]) -> Result<u64, sqlx::Error> {
    let mut linked = 0;
    for lutador_id in lutador_ids {
        linked += sqlx::query(
            r#"
            INSERT INTO noticia_lutadores (noticia_id, lutador_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(noticia_id)
        .bind(lutador_id)
        .execute(pool)
        .await?
        .rows_affected();
    }
    Ok(linked)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Noticia>, sqlx::Error> {
    sqlx::query_as::<_, Noticia>("SELECT * FROM noticias ORDER BY created_at")
        .fetch_all(pool)
        .await
}

/// Oldest first, so the first occurrence of a duplicate is the one to keep.
pub async fn list_resumos(pool: &PgPool) -> Result<Vec<NoticiaResumo>, sqlx::Error> {
    sqlx::query_as::<_, NoticiaResumo>(
        "SELECT id, titulo, fonte_url, created_at FROM noticias ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn update_text(
    pool: &PgPool,
    id: Uuid,
    titulo: &str,
    subtitulo: Option<&str>,
    conteudo: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        r#"
        UPDATE noticias
           SET titulo = $2, subtitulo = $3, conteudo = $4, updated_at = NOW()
         WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(titulo)
    .bind(subtitulo)
    .bind(conteudo)
    .execute(pool)
    .await?;
    Ok(done.rows_affected())
}

/// Deletes the rows and their comments in one transaction. Returns the
/// number of noticias removed.
pub async fn delete_many(pool: &PgPool, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM comentarios WHERE conteudo_tipo = 'noticia' AND conteudo_id = ANY($1)")
        .bind(ids)
        .execute(&mut *tx)
        .await?;
    let done = sqlx::query("DELETE FROM noticias WHERE id = ANY($1)")
        .bind(ids)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(done.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_zero_filled_for_every_category() {
        let rows = vec![("eventos".to_string(), 4), ("rumores".to_string(), 2)];
        let counts = ContagemCategorias::from_rows(&rows);
        assert_eq!(counts.total, 6);
        assert_eq!(counts.categorias.len(), NoticiaCategoria::ALL.len());
        assert_eq!(counts.categorias["eventos"], 4);
        assert_eq!(counts.categorias["rumores"], 2);
        assert_eq!(counts.categorias["entrevistas"], 0);
    }
}
