//! Local axum server standing in for the site API in client tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Clone)]
struct ServerState {
    hits: Arc<AtomicUsize>,
    healthy: Arc<AtomicBool>,
}

pub(crate) struct TestServer {
    pub base_url: String,
    pub hits: Arc<AtomicUsize>,
    pub healthy: Arc<AtomicBool>,
}

pub(crate) async fn spawn_server() -> TestServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let healthy = Arc::new(AtomicBool::new(true));
    let state = ServerState {
        hits: hits.clone(),
        healthy: healthy.clone(),
    };
    let app = Router::new()
        .route("/api/ranking", get(ranking))
        .route("/api/previsoes", get(list_previsoes).post(save_previsao))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url: format!("http://{addr}"),
        hits,
        healthy,
    }
}

fn unavailable() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "erro interno" }))).into_response()
}

/// Each call bumps `pontos` so tests can tell refetches apart.
async fn ranking(State(state): State<ServerState>) -> Response {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    if !state.healthy.load(Ordering::SeqCst) {
        return unavailable();
    }
    Json(json!([{
        "fingerprint": "ab".repeat(32),
        "apelido": null,
        "pontos": hit,
        "total_previsoes": 3,
        "acertos": 2,
        "precisao": 66.67,
        "updated_at": "2025-05-10T03:00:00Z",
    }]))
    .into_response()
}

async fn list_previsoes(State(state): State<ServerState>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    Json(json!([])).into_response()
}

async fn save_previsao(Json(body): Json<Value>) -> Response {
    if body["fingerprint"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "fingerprint é obrigatório" }))).into_response();
    }
    Json(json!({
        "id": "5f0c6c8e-9c1e-4d59-8f34-0d3f0b3a2c11",
        "luta_id": body["luta_id"],
        "fingerprint": body["fingerprint"],
        "vencedor_previsto_id": body["vencedor_previsto_id"],
        "metodo_previsto": body["metodo_previsto"],
        "round_previsto": body["round_previsto"],
        "pontos": null,
        "acertou": null,
        "created_at": "2025-05-10T03:00:00Z",
        "updated_at": "2025-05-10T03:00:00Z",
    }))
    .into_response()
}
