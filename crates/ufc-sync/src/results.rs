//! Recording a fight result and scoring the predictions made for it.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use ufc_core::scoring::{pontuar, Resultado};
use ufc_core::{Luta, Previsao};
use ufc_storage::db::{lutas, previsoes, ranking};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ResultError {
    #[error("luta não encontrada")]
    NotFound,
    #[error("vencedor precisa ser um dos lutadores da luta")]
    InvalidWinner,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultadoRegistrado {
    pub luta: Luta,
    pub previsoes_pontuadas: u64,
    pub ranking_atualizado: u64,
}

/// `(previsao id, pontos, acertou)` for each prediction.
pub fn score_all(previsoes: &[Previsao], resultado: &Resultado) -> Vec<(Uuid, i32, bool)> {
    previsoes
        .iter()
        .map(|p| {
            let score = pontuar(
                p.vencedor_previsto_id,
                p.metodo_previsto.as_deref(),
                p.round_previsto,
                resultado,
            );
            (p.id, score.pontos, score.acertou)
        })
        .collect()
}

fn fingerprints(previsoes: &[Previsao]) -> Vec<String> {
    previsoes
        .iter()
        .map(|p| p.fingerprint.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Writes the result, scores the fight's predictions and refreshes the
/// affected ranking rows in one transaction. Recording a result twice
/// rescores from scratch.
pub async fn record_result(
    pool: &PgPool,
    luta_id: Uuid,
    resultado: &Resultado,
    tempo: Option<&str>,
) -> Result<ResultadoRegistrado, ResultError> {
    let current = lutas::find(pool, luta_id).await?.ok_or(ResultError::NotFound)?;
    if resultado.vencedor_id != current.lutador1_id && resultado.vencedor_id != current.lutador2_id {
        return Err(ResultError::InvalidWinner);
    }

    let mut tx = pool.begin().await?;
    let luta = lutas::record_result(&mut *tx, luta_id, resultado, tempo)
        .await?
        .ok_or(ResultError::NotFound)?;
    let feitas = previsoes::list_by_luta(&mut *tx, luta_id).await?;
    let mut previsoes_pontuadas = 0;
    for (id, pontos, acertou) in score_all(&feitas, resultado) {
        previsoes_pontuadas += previsoes::set_score(&mut *tx, id, pontos, acertou).await?;
    }
    let ranking_atualizado = ranking::refresh(&mut *tx, &fingerprints(&feitas)).await?;
    tx.commit().await?;

    info!(
        luta_id = %luta_id,
        vencedor_id = %resultado.vencedor_id,
        previsoes_pontuadas,
        ranking_atualizado,
        "fight result recorded"
    );
    Ok(ResultadoRegistrado {
        luta,
        previsoes_pontuadas,
        ranking_atualizado,
    })
}
