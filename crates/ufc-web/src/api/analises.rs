use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use ufc_core::slug::slugify;
use ufc_core::Analise;
use ufc_storage::db::analises::{self, NovaAnalise};
use ufc_storage::db::Page;

use crate::auth::AdminUser;
use crate::error::{required, ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalisesQuery {
    evento: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

pub async fn list(State(state): State<Arc<AppState>>, ApiQuery(q): ApiQuery<AnalisesQuery>) -> ApiResult<Vec<Analise>> {
    let evento = q.evento.as_deref().map(str::trim).filter(|s| !s.is_empty());
    Ok(Json(analises::list(&state.pool, evento, Page::new(q.limit, q.offset, 20)).await?))
}

pub async fn show(State(state): State<Arc<AppState>>, ApiPath(slug): ApiPath<String>) -> ApiResult<Analise> {
    analises::find_by_slug(&state.pool, &slug)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("análise"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(mut nova): ApiJson<NovaAnalise>,
) -> ApiResult<Analise> {
    nova.titulo = required(&nova.titulo, "titulo")?;
    nova.slug = slugify(&required(&nova.slug, "slug")?);
    if nova.lutador1_id == nova.lutador2_id {
        return Err(ApiError::bad_request("os lutadores precisam ser diferentes"));
    }
    let analise = analises::insert(&state.pool, &nova)
        .await
        .map_err(|err| ApiError::from_write(err, "slug de análise já existe"))?;
    tracing::info!(slug = %analise.slug, "analysis created");
    Ok(Json(analise))
}
