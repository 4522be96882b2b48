//! One-shot cleanup scripts over stored rows. Each logs per row and returns
//! a summary; a failing row is counted and skipped.

use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use ufc_core::slug::{nome_from_slug, tipo_from_slug};
use ufc_core::text::{clean_fighter_name, clean_text, decode_entities, normalize_title};
use ufc_core::{Evento, EventoTipo};
use ufc_storage::db::{eventos, lutadores, noticias, ranking};
use uuid::Uuid;

use crate::dedup::normalize_url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub examined: u64,
    pub updated: u64,
    pub failed: u64,
}

impl MaintenanceReport {
    fn record(&mut self, outcome: Result<u64, sqlx::Error>, what: &str, id: Uuid) {
        match outcome {
            Ok(n) => {
                self.updated += n;
                info!(%id, what, "updated");
            }
            Err(err) => {
                self.failed += 1;
                warn!(%id, what, error = %err, "update failed");
            }
        }
    }
}

/// Decoded text, or `None` when decoding changes nothing.
pub fn decoded_if_changed(text: &str) -> Option<String> {
    let decoded = decode_entities(text);
    (decoded != text).then_some(decoded)
}

fn decode_opt(text: Option<&str>) -> (Option<String>, bool) {
    match text {
        Some(t) => match decoded_if_changed(t) {
            Some(d) => (Some(d), true),
            None => (Some(t.to_string()), false),
        },
        None => (None, false),
    }
}

pub async fn decode_entities_all(pool: &PgPool) -> Result<MaintenanceReport> {
    let mut report = MaintenanceReport::default();

    for noticia in noticias::list_all(pool).await.context("loading noticias")? {
        report.examined += 1;
        let titulo = decoded_if_changed(&noticia.titulo);
        let (subtitulo, sub_changed) = decode_opt(noticia.subtitulo.as_deref());
        let (conteudo, con_changed) = decode_opt(noticia.conteudo.as_deref());
        if titulo.is_none() && !sub_changed && !con_changed {
            continue;
        }
        let titulo = titulo.unwrap_or(noticia.titulo);
        let outcome = noticias::update_text(pool, noticia.id, &titulo, subtitulo.as_deref(), conteudo.as_deref()).await;
        report.record(outcome, "noticia", noticia.id);
    }

    for lutador in lutadores::list_all(pool).await.context("loading lutadores")? {
        report.examined += 1;
        let nome = decoded_if_changed(&lutador.nome);
        let (apelido, apelido_changed) = decode_opt(lutador.apelido.as_deref());
        if nome.is_none() && !apelido_changed {
            continue;
        }
        let nome = nome.unwrap_or(lutador.nome);
        let outcome = lutadores::update_nome_apelido(pool, lutador.id, &nome, apelido.as_deref()).await;
        report.record(outcome, "lutador", lutador.id);
    }

    for evento in eventos::list_all(pool).await.context("loading eventos")? {
        report.examined += 1;
        let nome = decoded_if_changed(&evento.nome);
        let (local, local_changed) = decode_opt(evento.local.as_deref());
        let (cidade, cidade_changed) = decode_opt(evento.cidade.as_deref());
        if nome.is_none() && !local_changed && !cidade_changed {
            continue;
        }
        let nome = nome.unwrap_or(evento.nome);
        let outcome = eventos::update_text(pool, evento.id, &nome, local.as_deref(), cidade.as_deref()).await;
        report.record(outcome, "evento", evento.id);
    }

    info!(?report, "decode-entities finished");
    Ok(report)
}

/// Cleaned `(nome, apelido)` when the stored pair differs. A nickname pulled
/// out of the name wins over the stored one.
pub fn clean_name_if_changed(nome: &str, apelido: Option<&str>) -> Option<(String, Option<String>)> {
    let (clean, extracted) = clean_fighter_name(nome);
    let novo_apelido = extracted.or_else(|| apelido.and_then(clean_text));
    (clean != nome || novo_apelido.as_deref() != apelido).then_some((clean, novo_apelido))
}

pub async fn clean_names(pool: &PgPool) -> Result<MaintenanceReport> {
    let mut report = MaintenanceReport::default();
    for lutador in lutadores::list_all(pool).await.context("loading lutadores")? {
        report.examined += 1;
        let Some((nome, apelido)) = clean_name_if_changed(&lutador.nome, lutador.apelido.as_deref()) else {
            continue;
        };
        let outcome = lutadores::update_nome_apelido(pool, lutador.id, &nome, apelido.as_deref()).await;
        report.record(outcome, "lutador", lutador.id);
    }
    info!(?report, "clean-names finished");
    Ok(report)
}

/// Name and type an event should have according to its slug, when either
/// differs from what is stored.
pub fn event_normalization(evento: &Evento) -> Option<(String, EventoTipo)> {
    let slug = evento.ufc_slug.as_deref().unwrap_or(&evento.slug);
    let tipo = tipo_from_slug(slug)?;
    let nome = nome_from_slug(slug).unwrap_or_else(|| evento.nome.clone());
    (nome != evento.nome || tipo != evento.tipo).then_some((nome, tipo))
}

pub async fn normalize_events(pool: &PgPool) -> Result<MaintenanceReport> {
    let mut report = MaintenanceReport::default();
    for evento in eventos::list_all(pool).await.context("loading eventos")? {
        report.examined += 1;
        let Some((nome, tipo)) = event_normalization(&evento) else {
            continue;
        };
        let outcome = eventos::update_nome_tipo(pool, evento.id, &nome, tipo).await;
        report.record(outcome, "evento", evento.id);
    }
    info!(?report, "normalize-events finished");
    Ok(report)
}

/// Ids to delete from an oldest-first list: any row whose normalized URL or
/// normalized title was already seen.
pub fn duplicate_ids<'a>(rows: impl IntoIterator<Item = (Uuid, &'a str, &'a str)>) -> Vec<Uuid> {
    let mut urls = HashSet::new();
    let mut titles = HashSet::new();
    let mut duplicates = Vec::new();
    for (id, fonte_url, titulo) in rows {
        let url = normalize_url(fonte_url);
        let title = normalize_title(titulo);
        if urls.contains(&url) || (!title.is_empty() && titles.contains(&title)) {
            duplicates.push(id);
            continue;
        }
        urls.insert(url);
        if !title.is_empty() {
            titles.insert(title);
        }
    }
    duplicates
}

pub async fn dedupe_news(pool: &PgPool) -> Result<MaintenanceReport> {
    let resumos = noticias::list_resumos(pool).await.context("loading noticias")?;
    let ids = duplicate_ids(resumos.iter().map(|r| (r.id, r.fonte_url.as_str(), r.titulo.as_str())));
    for id in &ids {
        info!(%id, "duplicate noticia");
    }
    let deleted = noticias::delete_many(pool, &ids).await.context("deleting duplicates")?;
    let report = MaintenanceReport {
        examined: resumos.len() as u64,
        updated: deleted,
        failed: 0,
    };
    info!(?report, "dedupe-news finished");
    Ok(report)
}

/// `None` when no event has that slug.
pub async fn delete_event(pool: &PgPool, slug: &str) -> Result<Option<eventos::DeleteSummary>> {
    let Some(evento) = eventos::find_by_slug(pool, slug).await.context("loading evento")? else {
        warn!(slug, "event not found");
        return Ok(None);
    };
    let mut tx = pool.begin().await?;
    let summary = eventos::delete_with_children(&mut *tx, evento.id)
        .await
        .with_context(|| format!("deleting event {slug}"))?;
    tx.commit().await?;
    info!(slug, ?summary, "event deleted");
    Ok(Some(summary))
}

pub async fn recompute_rankings(pool: &PgPool) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let written = ranking::recompute_all(&mut *tx).await.context("recomputing ranking")?;
    tx.commit().await?;
    info!(written, "ranking recomputed");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ufc_core::EventoStatus;

    fn evento(slug: &str, ufc_slug: Option<&str>, nome: &str, tipo: EventoTipo) -> Evento {
        let now = Utc::now();
        Evento {
            id: Uuid::new_v4(),
            nome: nome.into(),
            slug: slug.into(),
            ufc_slug: ufc_slug.map(str::to_string),
            local: None,
            cidade: None,
            pais: None,
            data: now,
            status: EventoStatus::Agendado,
            tipo,
            poster_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn numbered_card_gets_canonical_name_and_ppv() {
        let e = evento("ufc-315-makhachev", Some("ufc-315"), "UFC 315: Makhachev vs. Della Maddalena", EventoTipo::FightNight);
        assert_eq!(event_normalization(&e), Some(("UFC 315".to_string(), EventoTipo::Ppv)));

        let done = evento("ufc-315", Some("ufc-315"), "UFC 315", EventoTipo::Ppv);
        assert_eq!(event_normalization(&done), None);
    }

    #[test]
    fn fight_night_keeps_its_name() {
        let e = evento("ufc-fight-night-september-13-2025", None, "UFC Fight Night: Lopes vs. Silva", EventoTipo::Ppv);
        assert_eq!(
            event_normalization(&e),
            Some(("UFC Fight Night: Lopes vs. Silva".to_string(), EventoTipo::FightNight))
        );
        let other = evento("noche-ufc", None, "Noche UFC", EventoTipo::FightNight);
        assert_eq!(event_normalization(&other), None);
    }

    #[test]
    fn decoding_reports_only_changes() {
        assert_eq!(decoded_if_changed("Pereira &amp; Ankalaev"), Some("Pereira & Ankalaev".into()));
        assert_eq!(decoded_if_changed("Pereira & Ankalaev"), None);
    }

    #[test]
    fn names_are_cleaned_once() {
        assert_eq!(
            clean_name_if_changed("Alex \"Poatan\" Pereira", None),
            Some(("Alex Pereira".to_string(), Some("Poatan".to_string())))
        );
        assert_eq!(clean_name_if_changed("Alex Pereira", Some("Poatan")), None);
        assert_eq!(
            clean_name_if_changed("Jos&eacute;  Aldo", Some("Scarface")),
            Some(("José Aldo".to_string(), Some("Scarface".to_string())))
        );
    }

    #[test]
    fn oldest_row_survives_dedupe() {
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![
            (a, "https://x.com/a", "Pereira vence Ankalaev"),
            (b, "https://x.com/a/?utm_source=rss", "Outro título"),
            (c, "https://y.com/z", "Pereira vence Ankalaev!"),
            (d, "https://y.com/w", "Makhachev sobe de peso"),
        ];
        assert_eq!(duplicate_ids(rows), vec![b, c]);
    }
}
