use serde::Deserialize;
use sqlx::PgPool;
use ufc_core::{Comentario, ConteudoTipo};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NovoComentario {
    pub conteudo_tipo: ConteudoTipo,
    pub conteudo_id: Uuid,
    pub autor_nome: String,
    pub texto: String,
    pub fingerprint: Option<String>,
}

/// Approved comments only, newest first.
pub async fn list_visible(
    pool: &PgPool,
    conteudo_tipo: ConteudoTipo,
    conteudo_id: Uuid,
) -> Result<Vec<Comentario>, sqlx::Error> {
    sqlx::query_as::<_, Comentario>(
        r#"
        SELECT *
          FROM comentarios
         WHERE conteudo_tipo = $1
           AND conteudo_id = $2
           AND status = 'aprovado'
         ORDER BY created_at DESC
        "#,
    )
    .bind(conteudo_tipo.as_str())
    .bind(conteudo_id)
    .fetch_all(pool)
    .await
}

/// Table holding the content a comment of this kind points at.
pub fn target_table(conteudo_tipo: ConteudoTipo) -> &'static str {
    match conteudo_tipo {
        ConteudoTipo::Noticia => "noticias",
        ConteudoTipo::Analise => "analises",
        ConteudoTipo::Evento => "eventos",
    }
}

pub async fn target_exists(
    pool: &PgPool,
    conteudo_tipo: ConteudoTipo,
    conteudo_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
        target_table(conteudo_tipo)
    );
    sqlx::query_scalar::<_, bool>(&sql)
        .bind(conteudo_id)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &PgPool, novo: &NovoComentario) -> Result<Comentario, sqlx::Error> {
    sqlx::query_as::<_, Comentario>(
        r#"
        INSERT INTO comentarios (id, conteudo_tipo, conteudo_id, autor_nome, texto, fingerprint)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(novo.conteudo_tipo.as_str())
    .bind(novo.conteudo_id)
    .bind(&novo.autor_nome)
    .bind(&novo.texto)
    .bind(&novo.fingerprint)
    .fetch_one(pool)
    .await
}

/// Counts one report and flips the comment to `rejeitado` once the count
/// reaches `threshold`. Increment and comparison happen in a single UPDATE so
/// concurrent reports cannot lose a count; a rejected comment stays rejected.
pub async fn report(pool: &PgPool, id: Uuid, threshold: i32) -> Result<Option<Comentario>, sqlx::Error> {
    sqlx::query_as::<_, Comentario>(
        r#"
        UPDATE comentarios
           SET reportado_count = reportado_count + 1,
               status = CASE
                            WHEN reportado_count + 1 >= $2 THEN 'rejeitado'
                            ELSE status
                        END,
               updated_at = NOW()
         WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(threshold)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_content_kind_maps_to_its_table() {
        assert_eq!(target_table(ConteudoTipo::Noticia), "noticias");
        assert_eq!(target_table(ConteudoTipo::Analise), "analises");
        assert_eq!(target_table(ConteudoTipo::Evento), "eventos");
    }
}
