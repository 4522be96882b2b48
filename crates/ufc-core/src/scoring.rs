//! Prediction scoring against a recorded fight result.

use uuid::Uuid;

pub const PONTOS_VENCEDOR: i32 = 10;
pub const PONTOS_METODO: i32 = 5;
pub const PONTOS_ROUND: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resultado {
    pub vencedor_id: Uuid,
    pub metodo: Option<String>,
    pub round: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pontuacao {
    pub pontos: i32,
    pub acertou: bool,
}

/// Buckets free-text finish methods so "TKO (punches)" matches "KO/TKO".
pub fn metodo_categoria(metodo: &str) -> String {
    let lower = metodo.trim().to_lowercase();
    if lower.contains("ko") || lower.contains("nocaute") {
        "ko".to_string()
    } else if lower.contains("sub") || lower.contains("finaliza") {
        "finalizacao".to_string()
    } else if lower.contains("dec") {
        "decisao".to_string()
    } else {
        lower
    }
}

/// Method and round only count when the winner was called correctly.
pub fn pontuar(
    vencedor_previsto_id: Uuid,
    metodo_previsto: Option<&str>,
    round_previsto: Option<i32>,
    resultado: &Resultado,
) -> Pontuacao {
    if vencedor_previsto_id != resultado.vencedor_id {
        return Pontuacao {
            pontos: 0,
            acertou: false,
        };
    }
    let mut pontos = PONTOS_VENCEDOR;
    if let (Some(previsto), Some(real)) = (metodo_previsto, resultado.metodo.as_deref()) {
        if metodo_categoria(previsto) == metodo_categoria(real) {
            pontos += PONTOS_METODO;
        }
    }
    if round_previsto.is_some() && round_previsto == resultado.round {
        pontos += PONTOS_ROUND;
    }
    Pontuacao {
        pontos,
        acertou: true,
    }
}

pub fn precisao(acertos: i64, total: i64) -> f64 {
    if total <= 0 {
        0.0
    } else {
        acertos as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resultado(vencedor: Uuid) -> Resultado {
        Resultado {
            vencedor_id: vencedor,
            metodo: Some("TKO (punches)".into()),
            round: Some(2),
        }
    }

    #[test]
    fn wrong_winner_scores_nothing() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let p = pontuar(b, Some("KO/TKO"), Some(2), &resultado(a));
        assert_eq!(p, Pontuacao { pontos: 0, acertou: false });
    }

    #[test]
    fn exact_call_scores_all_bonuses() {
        let a = Uuid::new_v4();
        let p = pontuar(a, Some("KO/TKO"), Some(2), &resultado(a));
        assert_eq!(p.pontos, PONTOS_VENCEDOR + PONTOS_METODO + PONTOS_ROUND);
        assert!(p.acertou);
    }

    #[test]
    fn winner_only_when_method_and_round_miss() {
        let a = Uuid::new_v4();
        let p = pontuar(a, Some("Decisão"), Some(3), &resultado(a));
        assert_eq!(p.pontos, PONTOS_VENCEDOR);
        let p = pontuar(a, None, None, &resultado(a));
        assert_eq!(p.pontos, PONTOS_VENCEDOR);
    }

    #[test]
    fn precision_handles_empty_history() {
        assert_eq!(precisao(0, 0), 0.0);
        assert_eq!(precisao(3, 4), 0.75);
    }
}
