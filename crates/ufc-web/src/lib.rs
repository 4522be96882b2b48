//! Axum JSON API and the server-rendered landing page.

use std::sync::Arc;

use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use ufc_core::{Evento, Noticia};
use ufc_storage::db::{eventos, noticias};
use ufc_sync::SyncPipeline;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;

pub use config::WebConfig;
pub use error::ApiError;

pub const CRATE_NAME: &str = "ufc-web";

pub struct AppState {
    pub pool: PgPool,
    pub config: WebConfig,
    pub pipeline: Arc<SyncPipeline>,
}

impl AppState {
    pub fn new(pool: PgPool, config: WebConfig, pipeline: Arc<SyncPipeline>) -> Self {
        Self { pool, config, pipeline }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    noticias: Vec<Noticia>,
    eventos: Vec<Evento>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .nest("/api", api::router())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let port = state.config.port;
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let loaded = async {
        let noticias = noticias::latest(&state.pool, 12).await?;
        let eventos = eventos::upcoming(&state.pool, 5).await?;
        Ok::<_, sqlx::Error>(IndexTemplate { noticias, eventos })
    }
    .await;
    match loaded {
        Ok(tpl) => render_html(tpl),
        Err(err) => server_error(anyhow::Error::from(err)),
    }
}

fn render_html<T: Template>(tpl: T) -> Response {
    match tpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => server_error(anyhow::anyhow!(err.to_string())),
    }
}

fn server_error(err: anyhow::Error) -> Response {
    tracing::error!(error = %format!("{err:#}"), "landing page failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html("<h1>Erro interno</h1>".to_string()),
    )
        .into_response()
}
