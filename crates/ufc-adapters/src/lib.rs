//! Source adapter contracts plus the RSS and HTML listing adapters.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use ufc_core::{EventoDraft, LutadorDraft, NoticiaDraft};
use ufc_storage::{FetchError, HttpFetcher};
use url::Url;

pub mod article;
pub mod listing;
pub mod rss_feed;

pub use article::{article_meta, ArticleMeta};
pub use listing::{EventListAdapter, FighterListAdapter};
pub use rss_feed::RssNewsAdapter;

pub const CRATE_NAME: &str = "ufc-adapters";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crawlability {
    PublicHtml,
    Rss,
}

/// What a configured source yields, and therefore which adapter reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Rss,
    EventList,
    FighterList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    pub source_id: String,
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Noticia(NoticiaDraft),
    Evento(EventoDraft),
    Lutador(LutadorDraft),
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid feed: {0}")]
    Feed(#[from] rss::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_id(&self) -> &str;
    fn crawlability(&self) -> Crawlability;

    /// Fetches every target in order; the first failure aborts the source.
    async fn fetch(&self, http: &HttpFetcher, urls: &[String]) -> Result<Vec<FetchedPage>, AdapterError> {
        let mut pages = Vec::with_capacity(urls.len());
        for url in urls {
            let resp = http.fetch(self.source_id(), url).await?;
            info!(source_id = self.source_id(), url = %resp.final_url, bytes = resp.body.len(), "fetched");
            pages.push(FetchedPage {
                source_id: self.source_id().to_string(),
                url: resp.final_url,
                content_type: resp.content_type,
                body: resp.body,
                fetched_at: resp.fetched_at,
            });
        }
        Ok(pages)
    }

    fn parse(&self, page: &FetchedPage) -> Result<Vec<Draft>, AdapterError>;
}

pub fn adapter_for(kind: SourceKind, source_id: &str, fonte_nome: &str) -> Box<dyn SourceAdapter> {
    match kind {
        SourceKind::Rss => Box::new(RssNewsAdapter::new(source_id, fonte_nome)),
        SourceKind::EventList => Box::new(EventListAdapter::new(source_id)),
        SourceKind::FighterList => Box::new(FighterListAdapter::new(source_id)),
    }
}

/// Captured page on disk: `bundle.json` next to the raw body it points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureBundle {
    pub source_id: String,
    pub kind: SourceKind,
    pub captured_from_url: String,
    pub fetched_at: DateTime<Utc>,
    pub content_type: String,
    pub raw_path: String,
    pub notes: Option<String>,
}

pub fn load_fixture_page(bundle_path: impl AsRef<Path>) -> Result<(FixtureBundle, FetchedPage)> {
    let bundle_path = bundle_path.as_ref();
    let data = fs::read_to_string(bundle_path)
        .with_context(|| format!("reading {}", bundle_path.display()))?;
    let bundle: FixtureBundle = serde_json::from_str(&data)
        .with_context(|| format!("parsing {}", bundle_path.display()))?;
    let raw_path = bundle_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&bundle.raw_path);
    let body = fs::read(&raw_path)
        .with_context(|| format!("reading fixture raw artifact {}", raw_path.display()))?;
    let page = FetchedPage {
        source_id: bundle.source_id.clone(),
        url: bundle.captured_from_url.clone(),
        content_type: bundle.content_type.clone(),
        body,
        fetched_at: bundle.fetched_at,
    };
    Ok((bundle, page))
}

pub(crate) fn selector(css: &str) -> Result<Selector, AdapterError> {
    Selector::parse(css).map_err(|e| AdapterError::Message(format!("bad selector {css:?}: {e}")))
}

pub(crate) fn text_or_none(value: String) -> Option<String> {
    ufc_core::text::clean_text(&value)
}

pub(crate) fn element_text(element: ElementRef<'_>) -> Option<String> {
    text_or_none(element.text().collect::<Vec<_>>().join(" "))
}

pub(crate) fn first_text_in(element: ElementRef<'_>, sel: &Selector) -> Option<String> {
    element.select(sel).next().and_then(element_text)
}

pub(crate) fn first_attr_in(element: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    element
        .select(sel)
        .next()
        .and_then(|n| n.value().attr(attr))
        .and_then(|s| text_or_none(s.to_string()))
}

pub(crate) fn select_first_attr(document: &Html, css: &str, attr: &str) -> Result<Option<String>, AdapterError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .next()
        .and_then(|n| n.value().attr(attr))
        .and_then(|s| text_or_none(s.to_string())))
}

/// Visible text of an HTML fragment, tags dropped and entities decoded.
pub fn strip_html(fragment: &str) -> Option<String> {
    let doc = Html::parse_fragment(fragment);
    text_or_none(doc.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Resolves a link against the page it came from. Only http(s) results
/// are returned.
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base).ok()?.join(href).ok()?,
        Err(_) => return None,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_decodes_entities() {
        assert_eq!(
            strip_html("<p>Pereira &amp; Ankalaev <b>rematch</b></p>").as_deref(),
            Some("Pereira & Ankalaev rematch")
        );
        assert_eq!(strip_html("<img src=\"x.jpg\">"), None);
    }

    #[test]
    fn relative_links_are_resolved_against_origin() {
        assert_eq!(
            absolutize("https://www.ufc.com/events?page=2", "/event/ufc-315").as_deref(),
            Some("https://www.ufc.com/event/ufc-315")
        );
        assert_eq!(
            absolutize("https://www.mmafighting.com/2025/8/1/story", "img/capa.jpg").as_deref(),
            Some("https://www.mmafighting.com/2025/8/1/img/capa.jpg")
        );
        assert_eq!(
            absolutize("https://a.com/x", "//cdn.b.com/y.jpg").as_deref(),
            Some("https://cdn.b.com/y.jpg")
        );
        assert_eq!(absolutize("https://a.com/x", "https://b.com/y").as_deref(), Some("https://b.com/y"));
        assert_eq!(absolutize("https://a.com/x", "javascript:alert(1)"), None);
        assert_eq!(absolutize("não é url", "/x.jpg"), None);
    }

    #[test]
    fn adapters_are_built_per_kind() {
        let rss = adapter_for(SourceKind::Rss, "mma-fighting", "MMA Fighting");
        assert_eq!(rss.source_id(), "mma-fighting");
        assert_eq!(rss.crawlability(), Crawlability::Rss);
        let events = adapter_for(SourceKind::EventList, "ufc-events", "UFC");
        assert_eq!(events.crawlability(), Crawlability::PublicHtml);
    }

    #[test]
    fn source_kinds_use_kebab_case() {
        let kind: SourceKind = serde_json::from_str("\"fighter-list\"").unwrap();
        assert_eq!(kind, SourceKind::FighterList);
    }
}
