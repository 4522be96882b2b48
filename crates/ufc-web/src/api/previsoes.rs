use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use ufc_core::{Luta, LutaStatus, Previsao, RankingPrevisor};
use ufc_storage::db::previsoes::{self, NovaPrevisao};
use ufc_storage::db::{lutas, ranking};

use super::lutadores::validate_round;
use crate::error::{required, ApiError, ApiJson, ApiQuery, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PrevisoesQuery {
    fingerprint: Option<String>,
}

pub async fn list(State(state): State<Arc<AppState>>, ApiQuery(q): ApiQuery<PrevisoesQuery>) -> ApiResult<Vec<Previsao>> {
    let fingerprint = required(q.fingerprint.as_deref().unwrap_or_default(), "fingerprint")?;
    Ok(Json(previsoes::list_by_fingerprint(&state.pool, &fingerprint).await?))
}

/// A pick is only open while the fight is scheduled and must name one of
/// its two fighters.
pub fn check_pick(luta: &Luta, nova: &NovaPrevisao) -> Result<(), ApiError> {
    match luta.status {
        LutaStatus::Finalizada => return Err(ApiError::bad_request("luta já finalizada")),
        LutaStatus::Cancelada => return Err(ApiError::bad_request("luta cancelada")),
        LutaStatus::Agendada => {}
    }
    if nova.vencedor_previsto_id != luta.lutador1_id && nova.vencedor_previsto_id != luta.lutador2_id {
        return Err(ApiError::bad_request("vencedor precisa ser um dos lutadores da luta"));
    }
    validate_round(nova.round_previsto)
}

pub async fn upsert(
    State(state): State<Arc<AppState>>,
    ApiJson(mut nova): ApiJson<NovaPrevisao>,
) -> ApiResult<Previsao> {
    nova.fingerprint = required(&nova.fingerprint, "fingerprint")?;
    let luta = lutas::find(&state.pool, nova.luta_id)
        .await?
        .ok_or(ApiError::NotFound("luta"))?;
    check_pick(&luta, &nova)?;
    let previsao = previsoes::upsert(&state.pool, &nova).await?;
    tracing::info!(luta_id = %nova.luta_id, "prediction saved");
    Ok(Json(previsao))
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    limit: Option<i64>,
}

pub async fn ranking(State(state): State<Arc<AppState>>, ApiQuery(q): ApiQuery<RankingQuery>) -> ApiResult<Vec<RankingPrevisor>> {
    let limit = q.limit.unwrap_or(50).clamp(1, 100);
    Ok(Json(ranking::top(&state.pool, limit).await?))
}
