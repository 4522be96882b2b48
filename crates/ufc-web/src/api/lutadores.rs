use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use ufc_core::scoring::Resultado;
use ufc_core::slug::slugify;
use ufc_core::text::clean_fighter_name;
use ufc_core::{Luta, Lutador};
use ufc_storage::db::lutadores::{self, LutadorFiltro, NovoLutador};
use ufc_storage::db::lutas::{self, NovaLuta};
use ufc_storage::db::Page;
use ufc_sync::results::{self, ResultadoRegistrado};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::{required, ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

pub const MAX_ROUND: i32 = 5;

#[derive(Debug, Deserialize)]
pub struct LutadoresQuery {
    categoria: Option<String>,
    q: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<LutadoresQuery>,
) -> ApiResult<Vec<Lutador>> {
    let filtro = LutadorFiltro {
        categoria_peso: non_blank(q.categoria),
        busca: non_blank(q.q),
    };
    Ok(Json(lutadores::list(&state.pool, &filtro, Page::new(q.limit, q.offset, 50)).await?))
}

pub async fn show(State(state): State<Arc<AppState>>, ApiPath(slug): ApiPath<String>) -> ApiResult<Lutador> {
    lutadores::find_by_slug(&state.pool, &slug)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("lutador"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(mut novo): ApiJson<NovoLutador>,
) -> ApiResult<Lutador> {
    let (nome, apelido) = clean_fighter_name(&required(&novo.nome, "nome")?);
    novo.nome = nome;
    novo.apelido = non_blank(novo.apelido).or(apelido);
    let slug = match non_blank(novo.slug.take()) {
        Some(slug) => slugify(&slug),
        None => slugify(&novo.nome),
    };
    if slug.is_empty() {
        return Err(ApiError::bad_request("slug inválido"));
    }
    let lutador = lutadores::insert(&state.pool, &novo, &slug)
        .await
        .map_err(|err| ApiError::from_write(err, "slug de lutador já existe"))?;
    tracing::info!(slug = %lutador.slug, "fighter created");
    Ok(Json(lutador))
}

pub async fn create_luta(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(nova): ApiJson<NovaLuta>,
) -> ApiResult<Luta> {
    if nova.lutador1_id == nova.lutador2_id {
        return Err(ApiError::bad_request("os lutadores precisam ser diferentes"));
    }
    let luta = lutas::insert(&state.pool, &nova)
        .await
        .map_err(|err| ApiError::from_write(err, "luta já existe"))?;
    tracing::info!(luta_id = %luta.id, evento_id = %luta.evento_id, "fight added to card");
    Ok(Json(luta))
}

pub async fn show_luta(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Luta> {
    lutas::find(&state.pool, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("luta"))
}

#[derive(Debug, Deserialize)]
pub struct ResultadoRequest {
    pub vencedor_id: Uuid,
    pub metodo: Option<String>,
    pub round: Option<i32>,
    pub tempo: Option<String>,
}

pub fn validate_round(round: Option<i32>) -> Result<(), ApiError> {
    match round {
        Some(r) if !(1..=MAX_ROUND).contains(&r) => {
            Err(ApiError::BadRequest(format!("round precisa estar entre 1 e {MAX_ROUND}")))
        }
        _ => Ok(()),
    }
}

pub async fn record_result(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ResultadoRequest>,
) -> ApiResult<ResultadoRegistrado> {
    validate_round(req.round)?;
    let resultado = Resultado {
        vencedor_id: req.vencedor_id,
        metodo: non_blank(req.metodo),
        round: req.round,
    };
    let tempo = non_blank(req.tempo);
    let registrado = results::record_result(&state.pool, id, &resultado, tempo.as_deref()).await?;
    tracing::info!(admin = %admin.email, luta_id = %id, "result recorded");
    Ok(Json(registrado))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_outside_the_fight_are_rejected() {
        assert!(validate_round(None).is_ok());
        assert!(validate_round(Some(1)).is_ok());
        assert!(validate_round(Some(5)).is_ok());
        assert!(validate_round(Some(0)).is_err());
        assert!(validate_round(Some(6)).is_err());
    }

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" Peso-leve ".into())).as_deref(), Some("Peso-leve"));
    }
}
