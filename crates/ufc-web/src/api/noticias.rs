use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use ufc_core::images::{parse_http_url, ImageHostPolicy};
use ufc_core::{Noticia, NoticiaCategoria};
use ufc_storage::db::noticias::{self, ContagemCategorias, NoticiaFiltro, NovaNoticia};
use ufc_storage::db::Page;
use ufc_sync::normalize_url;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::{required, ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NoticiasQuery {
    categoria: Option<NoticiaCategoria>,
    lutador: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

pub async fn list(State(state): State<Arc<AppState>>, ApiQuery(q): ApiQuery<NoticiasQuery>) -> ApiResult<Vec<Noticia>> {
    let filtro = NoticiaFiltro {
        categoria: q.categoria,
        lutador_slug: q.lutador.filter(|s| !s.trim().is_empty()),
    };
    Ok(Json(noticias::list(&state.pool, &filtro, Page::new(q.limit, q.offset, 20)).await?))
}

pub async fn counts(State(state): State<Arc<AppState>>) -> ApiResult<ContagemCategorias> {
    Ok(Json(noticias::contagens(&state.pool).await?))
}

/// Each successful fetch counts one view.
pub async fn show(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Noticia> {
    noticias::view(&state.pool, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("notícia"))
}

/// Validates a posted article: required text, http(s) source link in its
/// canonical form, image dropped unless its host is allowed.
pub fn prepare(mut nova: NovaNoticia, images: &ImageHostPolicy) -> Result<NovaNoticia, ApiError> {
    nova.titulo = required(&nova.titulo, "titulo")?;
    let fonte_url = required(&nova.fonte_url, "fonte_url")?;
    if parse_http_url(&fonte_url).is_none() {
        return Err(ApiError::bad_request("fonte_url precisa ser http(s)"));
    }
    nova.fonte_url = normalize_url(&fonte_url);
    nova.imagem_url = images.filter(nova.imagem_url.take());
    Ok(nova)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(nova): ApiJson<NovaNoticia>,
) -> ApiResult<Noticia> {
    let nova = prepare(nova, &state.config.image_hosts)?;
    let noticia = noticias::insert_if_new(&state.pool, &nova)
        .await?
        .ok_or_else(|| ApiError::Conflict("notícia já cadastrada".into()))?;
    tracing::info!(id = %noticia.id, fonte_url = %noticia.fonte_url, "news created");
    Ok(Json(noticia))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nova(titulo: &str, fonte_url: &str, imagem_url: Option<&str>) -> NovaNoticia {
        NovaNoticia {
            titulo: titulo.into(),
            subtitulo: None,
            conteudo: None,
            imagem_url: imagem_url.map(str::to_string),
            fonte_url: fonte_url.into(),
            fonte_nome: None,
            categoria: NoticiaCategoria::Geral,
            publicado_em: None,
        }
    }

    #[test]
    fn posted_news_is_normalized() {
        let ok = prepare(
            nova(" UFC 320 ", "https://www.ufc.com/news/x/?utm_source=tw", Some("https://www.ufc.com/img.jpg")),
            &ImageHostPolicy::default(),
        )
        .unwrap();
        assert_eq!(ok.titulo, "UFC 320");
        assert_eq!(ok.fonte_url, "https://www.ufc.com/news/x");
        assert_eq!(ok.imagem_url.as_deref(), Some("https://www.ufc.com/img.jpg"));

        let dropped = prepare(
            nova("UFC 320", "https://www.ufc.com/a", Some("https://evil.example/x.jpg")),
            &ImageHostPolicy::default(),
        )
        .unwrap();
        assert_eq!(dropped.imagem_url, None);
    }

    #[test]
    fn posted_news_needs_title_and_web_link() {
        let policy = ImageHostPolicy::default();
        assert!(matches!(prepare(nova(" ", "https://a.com", None), &policy), Err(ApiError::BadRequest(_))));
        assert!(matches!(prepare(nova("UFC", "ftp://a.com/x", None), &policy), Err(ApiError::BadRequest(_))));
        assert!(matches!(prepare(nova("UFC", "https://", None), &policy), Err(ApiError::BadRequest(_))));
        let upper = prepare(nova("UFC", "HTTPS://WWW.UFC.COM/News", None), &policy).unwrap();
        assert_eq!(upper.fonte_url, "https://www.ufc.com/News");
    }
}
