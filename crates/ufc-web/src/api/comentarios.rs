use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use ufc_core::{Comentario, ConteudoTipo};
use ufc_storage::db::comentarios::{self, NovoComentario};
use uuid::Uuid;

use crate::error::{required, ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

pub const MAX_AUTOR_CHARS: usize = 80;
pub const MAX_TEXTO_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct ComentariosQuery {
    tipo: Option<ConteudoTipo>,
    id: Option<Uuid>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<ComentariosQuery>,
) -> ApiResult<Vec<Comentario>> {
    let (Some(tipo), Some(id)) = (q.tipo, q.id) else {
        return Err(ApiError::bad_request("tipo e id são obrigatórios"));
    };
    Ok(Json(comentarios::list_visible(&state.pool, tipo, id).await?))
}

pub fn validate(mut novo: NovoComentario) -> Result<NovoComentario, ApiError> {
    novo.autor_nome = required(&novo.autor_nome, "autor_nome")?;
    novo.texto = required(&novo.texto, "texto")?;
    if novo.autor_nome.chars().count() > MAX_AUTOR_CHARS {
        return Err(ApiError::BadRequest(format!("autor_nome passa de {MAX_AUTOR_CHARS} caracteres")));
    }
    if novo.texto.chars().count() > MAX_TEXTO_CHARS {
        return Err(ApiError::BadRequest(format!("texto passa de {MAX_TEXTO_CHARS} caracteres")));
    }
    novo.fingerprint = novo.fingerprint.filter(|f| !f.trim().is_empty());
    Ok(novo)
}

fn target_label(conteudo_tipo: ConteudoTipo) -> &'static str {
    match conteudo_tipo {
        ConteudoTipo::Noticia => "notícia",
        ConteudoTipo::Analise => "análise",
        ConteudoTipo::Evento => "evento",
    }
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(novo): ApiJson<NovoComentario>,
) -> ApiResult<Comentario> {
    let novo = validate(novo)?;
    if !comentarios::target_exists(&state.pool, novo.conteudo_tipo, novo.conteudo_id).await? {
        return Err(ApiError::NotFound(target_label(novo.conteudo_tipo)));
    }
    let comentario = comentarios::insert(&state.pool, &novo).await?;
    tracing::info!(id = %comentario.id, conteudo_tipo = %comentario.conteudo_tipo, "comment created");
    Ok(Json(comentario))
}

/// One report per call, counted atomically; the comment is hidden once the
/// count reaches the configured threshold.
pub async fn report(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Comentario> {
    let comentario = comentarios::report(&state.pool, id, state.config.report_threshold)
        .await?
        .ok_or(ApiError::NotFound("comentário"))?;
    tracing::info!(
        id = %comentario.id,
        reportado_count = comentario.reportado_count,
        status = %comentario.status,
        "comment reported"
    );
    Ok(Json(comentario))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn novo(autor: &str, texto: &str) -> NovoComentario {
        NovoComentario {
            conteudo_tipo: ConteudoTipo::Noticia,
            conteudo_id: Uuid::new_v4(),
            autor_nome: autor.into(),
            texto: texto.into(),
            fingerprint: Some("  ".into()),
        }
    }

    #[test]
    fn comments_are_trimmed_and_bounded() {
        let ok = validate(novo(" Ana ", " Que luta! ")).unwrap();
        assert_eq!(ok.autor_nome, "Ana");
        assert_eq!(ok.texto, "Que luta!");
        assert_eq!(ok.fingerprint, None);

        assert!(validate(novo("", "texto")).is_err());
        assert!(validate(novo("Ana", &"a".repeat(MAX_TEXTO_CHARS + 1))).is_err());
        assert!(validate(novo(&"b".repeat(MAX_AUTOR_CHARS + 1), "ok")).is_err());
    }
}
