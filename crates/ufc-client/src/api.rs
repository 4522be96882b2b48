use std::sync::Arc;

use serde::Serialize;
use ufc_core::{Evento, Previsao, RankingPrevisor};
use uuid::Uuid;

use crate::cache::{Cached, CachedClient, ClientError};
use crate::fingerprint::Fingerprint;

#[derive(Debug, Clone, Serialize)]
pub struct PrevisaoRequest {
    pub luta_id: Uuid,
    pub fingerprint: String,
    pub vencedor_previsto_id: Uuid,
    pub metodo_previsto: Option<String>,
    pub round_previsto: Option<i32>,
}

/// Typed reads and writes against the site's `/api` routes.
#[derive(Debug, Clone)]
pub struct UfcApi {
    client: Arc<CachedClient>,
}

impl UfcApi {
    pub fn new(client: Arc<CachedClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<CachedClient> {
        &self.client
    }

    pub async fn ranking(&self, limit: i64) -> Result<Cached<Vec<RankingPrevisor>>, ClientError> {
        self.client.get_json(&format!("/api/ranking?limit={limit}")).await
    }

    pub async fn upcoming_events(&self) -> Result<Cached<Vec<Evento>>, ClientError> {
        self.client.get_json("/api/eventos?status=agendado").await
    }

    pub async fn my_predictions(&self, fingerprint: &Fingerprint) -> Result<Cached<Vec<Previsao>>, ClientError> {
        self.client
            .get_json(&format!("/api/previsoes?fingerprint={fingerprint}"))
            .await
    }

    /// Saves a pick and drops cached reads it makes outdated.
    pub async fn predict(
        &self,
        fingerprint: &Fingerprint,
        luta_id: Uuid,
        vencedor_id: Uuid,
        metodo: Option<String>,
        round: Option<i32>,
    ) -> Result<Previsao, ClientError> {
        let body = PrevisaoRequest {
            luta_id,
            fingerprint: fingerprint.to_string(),
            vencedor_previsto_id: vencedor_id,
            metodo_previsto: metodo,
            round_previsto: round,
        };
        let saved = self.client.post_json("/api/previsoes", &body).await?;
        self.client.invalidate_prefix("/api/previsoes").await;
        self.client.invalidate_prefix("/api/ranking").await;
        Ok(saved)
    }
}
