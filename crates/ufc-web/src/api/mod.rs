//! JSON routes under `/api`.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use ufc_sync::SyncReport;

use crate::auth::{self, AdminUser};
use crate::error::ApiResult;
use crate::AppState;

mod analises;
mod comentarios;
mod eventos;
mod lutadores;
mod noticias;
mod previsoes;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/eventos", get(eventos::list).post(eventos::create))
        .route("/eventos/{slug}", get(eventos::show))
        .route("/lutadores", get(lutadores::list).post(lutadores::create))
        .route("/lutadores/{slug}", get(lutadores::show))
        .route("/lutas", post(lutadores::create_luta))
        .route("/lutas/{id}", get(lutadores::show_luta))
        .route("/lutas/{id}/resultado", put(lutadores::record_result))
        .route("/noticias", get(noticias::list).post(noticias::create))
        .route("/noticias/contagens", get(noticias::counts))
        .route("/noticias/{id}", get(noticias::show))
        .route("/analises", get(analises::list).post(analises::create))
        .route("/analises/{slug}", get(analises::show))
        .route("/previsoes", get(previsoes::list).post(previsoes::upsert))
        .route("/ranking", get(previsoes::ranking))
        .route("/comentarios", get(comentarios::list).post(comentarios::create))
        .route("/comentarios/{id}/reportar", post(comentarios::report))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route("/sync", post(sync))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn sync(State(state): State<Arc<AppState>>, AdminUser(admin): AdminUser) -> ApiResult<SyncReport> {
    tracing::info!(admin = %admin.email, "sync requested");
    let report = state.pipeline.sync_news(&state.pool).await?;
    Ok(Json(report))
}
