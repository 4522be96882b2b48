//! Event and fighter listing pages (ufc.com card markup).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use scraper::Html;
use ufc_core::slug::{nome_from_slug, slugify, tipo_from_slug};
use ufc_core::text::clean_fighter_name;
use ufc_core::{EventoDraft, EventoStatus, EventoTipo, LutadorDraft};

use crate::{
    element_text, first_attr_in, first_text_in, selector, AdapterError, Crawlability, Draft,
    FetchedPage, SourceAdapter,
};

/// Main cards rarely run past this, so a card older than it is over.
const EVENT_LIVE_WINDOW_HOURS: i64 = 8;

#[derive(Debug, Clone)]
pub struct EventListAdapter {
    source_id: String,
}

impl EventListAdapter {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
        }
    }

    pub fn parse_events(&self, page: &FetchedPage) -> Result<Vec<EventoDraft>, AdapterError> {
        let document = Html::parse_document(&page.text());
        let card = selector(".c-card-event--result")?;
        let headline = selector(".c-card-event--result__headline a")?;
        let date = selector(".c-card-event--result__date")?;
        let venue = selector(".c-card-event--result__location h5")?;
        let locality = selector(".locality")?;
        let country = selector(".country")?;

        let mut out = Vec::new();
        for node in document.select(&card) {
            let Some(href) = first_attr_in(node, &headline, "href") else {
                continue;
            };
            let slug = slug_from_href(&href);
            if slug.is_empty() {
                continue;
            }
            let titulo = first_text_in(node, &headline);
            let data = first_attr_in(node, &date, "data-main-card-timestamp")
                .and_then(|ts| ts.parse::<i64>().ok())
                .and_then(|secs| DateTime::from_timestamp(secs, 0));
            out.push(EventoDraft {
                source_id: self.source_id.clone(),
                nome: event_name(&slug, titulo.as_deref()),
                slug,
                data,
                local: first_text_in(node, &venue),
                cidade: first_text_in(node, &locality),
                pais: first_text_in(node, &country),
                status: status_at(data, page.fetched_at),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for EventListAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn crawlability(&self) -> Crawlability {
        Crawlability::PublicHtml
    }

    fn parse(&self, page: &FetchedPage) -> Result<Vec<Draft>, AdapterError> {
        Ok(self.parse_events(page)?.into_iter().map(Draft::Evento).collect())
    }
}

#[derive(Debug, Clone)]
pub struct FighterListAdapter {
    source_id: String,
}

impl FighterListAdapter {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
        }
    }

    pub fn parse_fighters(&self, page: &FetchedPage) -> Result<Vec<LutadorDraft>, AdapterError> {
        let document = Html::parse_document(&page.text());
        let card = selector(".c-listing-athlete-flipcard")?;
        let name = selector(".c-listing-athlete__name")?;
        let nickname = selector(".c-listing-athlete__nickname")?;
        let division = selector(".c-listing-athlete__title")?;
        let record = selector(".c-listing-athlete__record")?;
        let rank = selector(".c-listing-athlete__rank")?;
        let country = selector(".c-listing-athlete__country")?;
        let link = selector("a[href*='/athlete/']")?;

        let mut out = Vec::new();
        for node in document.select(&card) {
            let Some(raw_name) = node.select(&name).next().and_then(element_text) else {
                continue;
            };
            let (nome, inline_nickname) = clean_fighter_name(&raw_name);
            if nome.is_empty() {
                continue;
            }
            let apelido = first_text_in(node, &nickname)
                .map(|n| n.trim_matches(|c| c == '"' || c == '“' || c == '”').trim().to_string())
                .filter(|n| !n.is_empty())
                .or(inline_nickname);
            let slug = first_attr_in(node, &link, "href")
                .map(|href| slug_from_href(&href))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| slugify(&nome));
            let (vitorias, derrotas, empates) = first_text_in(node, &record)
                .and_then(|r| parse_record(&r))
                .unwrap_or((0, 0, 0));
            out.push(LutadorDraft {
                source_id: self.source_id.clone(),
                nome,
                apelido,
                slug,
                categoria_peso: first_text_in(node, &division),
                vitorias,
                derrotas,
                empates,
                pais: first_text_in(node, &country),
                ranking: first_text_in(node, &rank).and_then(|r| parse_rank(&r)),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for FighterListAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn crawlability(&self) -> Crawlability {
        Crawlability::PublicHtml
    }

    fn parse(&self, page: &FetchedPage) -> Result<Vec<Draft>, AdapterError> {
        Ok(self.parse_fighters(page)?.into_iter().map(Draft::Lutador).collect())
    }
}

/// Last path segment, lowercased, query and fragment dropped.
pub fn slug_from_href(href: &str) -> String {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

fn event_name(slug: &str, headline: Option<&str>) -> String {
    if let Some(nome) = nome_from_slug(slug) {
        return nome;
    }
    match (tipo_from_slug(slug), headline) {
        (Some(EventoTipo::FightNight), Some(h)) => format!("UFC Fight Night: {h}"),
        (_, Some(h)) => h.to_string(),
        (_, None) => slug.to_string(),
    }
}

fn status_at(data: Option<DateTime<Utc>>, now: DateTime<Utc>) -> EventoStatus {
    match data {
        Some(start) if now >= start + Duration::hours(EVENT_LIVE_WINDOW_HOURS) => EventoStatus::Finalizado,
        Some(start) if now >= start => EventoStatus::AoVivo,
        _ => EventoStatus::Agendado,
    }
}

/// `"24-3-0 (W-L-D)"` -> `(24, 3, 0)`; a missing draw count reads as zero.
pub fn parse_record(text: &str) -> Option<(i32, i32, i32)> {
    let token = text.split_whitespace().next()?;
    let mut parts = token.split('-').map(|p| p.trim().parse::<i32>());
    let wins = parts.next()?.ok()?;
    let losses = parts.next()?.ok()?;
    let draws = match parts.next() {
        Some(d) => d.ok()?,
        None => 0,
    };
    Some((wins, losses, draws))
}

/// `"#3"` -> 3; champions (`"C"`) rank 0.
fn parse_rank(text: &str) -> Option<i32> {
    let t = text.trim().trim_start_matches('#');
    if t.eq_ignore_ascii_case("c") {
        return Some(0);
    }
    t.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_parse_with_and_without_draws() {
        assert_eq!(parse_record("24-3-0 (W-L-D)"), Some((24, 3, 0)));
        assert_eq!(parse_record("12-1"), Some((12, 1, 0)));
        assert_eq!(parse_record("sem cartel"), None);
    }

    #[test]
    fn slugs_come_from_the_last_path_segment() {
        assert_eq!(slug_from_href("/event/UFC-315?lang=pt"), "ufc-315");
        assert_eq!(slug_from_href("https://www.ufc.com/athlete/alex-pereira/"), "alex-pereira");
    }

    #[test]
    fn ppv_names_follow_the_slug() {
        assert_eq!(event_name("ufc-315", Some("Muhammad vs Della Maddalena")), "UFC 315");
        assert_eq!(
            event_name("ufc-fight-night-may-17-2025", Some("Burns vs Morales")),
            "UFC Fight Night: Burns vs Morales"
        );
    }

    #[test]
    fn status_tracks_the_main_card_start() {
        let start = DateTime::from_timestamp(1_746_900_000, 0).unwrap();
        assert_eq!(status_at(Some(start), start - Duration::days(1)), EventoStatus::Agendado);
        assert_eq!(status_at(Some(start), start + Duration::hours(1)), EventoStatus::AoVivo);
        assert_eq!(status_at(Some(start), start + Duration::days(1)), EventoStatus::Finalizado);
        assert_eq!(status_at(None, start), EventoStatus::Agendado);
    }

    #[test]
    fn ranks_parse() {
        assert_eq!(parse_rank("#3"), Some(3));
        assert_eq!(parse_rank("C"), Some(0));
        assert_eq!(parse_rank("NR"), None);
    }
}
