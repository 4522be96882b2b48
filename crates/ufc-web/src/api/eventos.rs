use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use ufc_core::slug::tipo_from_slug;
use ufc_core::{Evento, EventoStatus, EventoTipo, LutaCard};
use ufc_storage::db::eventos::{self, EventoFiltro, NovoEvento};
use ufc_storage::db::Page;

use crate::auth::AdminUser;
use crate::error::{required, ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EventosQuery {
    status: Option<EventoStatus>,
    tipo: Option<EventoTipo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EventoDetalhe {
    #[serde(flatten)]
    evento: Evento,
    lutas: Vec<LutaCard>,
}

pub async fn list(State(state): State<Arc<AppState>>, ApiQuery(q): ApiQuery<EventosQuery>) -> ApiResult<Vec<Evento>> {
    let filtro = EventoFiltro {
        status: q.status,
        tipo: q.tipo,
    };
    Ok(Json(eventos::list(&state.pool, &filtro, Page::new(q.limit, q.offset, 20)).await?))
}

pub async fn show(State(state): State<Arc<AppState>>, ApiPath(slug): ApiPath<String>) -> ApiResult<EventoDetalhe> {
    let evento = eventos::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or(ApiError::NotFound("evento"))?;
    let lutas = eventos::card(&state.pool, evento.id).await?;
    Ok(Json(EventoDetalhe { evento, lutas }))
}

/// The slug rule decides the type whenever it applies; the body's `tipo`
/// only fills in for slugs that follow neither pattern.
pub fn tipo_for(novo: &NovoEvento) -> EventoTipo {
    let slug = novo.ufc_slug.as_deref().unwrap_or(&novo.slug);
    tipo_from_slug(slug)
        .or(novo.tipo)
        .unwrap_or(EventoTipo::FightNight)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(mut novo): ApiJson<NovoEvento>,
) -> ApiResult<Evento> {
    novo.nome = required(&novo.nome, "nome")?;
    novo.slug = required(&novo.slug, "slug")?;
    let tipo = tipo_for(&novo);
    let evento = eventos::insert(&state.pool, &novo, tipo)
        .await
        .map_err(|err| ApiError::from_write(err, "slug de evento já existe"))?;
    tracing::info!(slug = %evento.slug, tipo = %evento.tipo, "event created");
    Ok(Json(evento))
}
