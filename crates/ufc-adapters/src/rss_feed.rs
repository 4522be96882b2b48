use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rss::{Channel, Item};
use scraper::Html;
use ufc_core::NoticiaDraft;

use crate::{absolutize, selector, strip_html, text_or_none, AdapterError, Crawlability, Draft, FetchedPage, SourceAdapter};

/// News feed reader: one draft per `<item>`, nothing filtered here.
#[derive(Debug, Clone)]
pub struct RssNewsAdapter {
    source_id: String,
    fonte_nome: String,
}

impl RssNewsAdapter {
    pub fn new(source_id: impl Into<String>, fonte_nome: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            fonte_nome: fonte_nome.into(),
        }
    }

    /// `feed_url` resolves relative links for items that carry none of their own.
    pub fn parse_feed(&self, body: &[u8], feed_url: &str) -> Result<Vec<NoticiaDraft>, AdapterError> {
        let channel = Channel::read_from(body)?;
        channel
            .items()
            .iter()
            .map(|item| self.item_to_draft(item, feed_url))
            .collect()
    }

    fn item_to_draft(&self, item: &Item, feed_url: &str) -> Result<NoticiaDraft, AdapterError> {
        let base = item.link().map(str::trim).filter(|l| !l.is_empty()).unwrap_or(feed_url);
        let subtitulo = item.description().and_then(strip_html);
        let conteudo = item.content().and_then(strip_html).or_else(|| subtitulo.clone());
        Ok(NoticiaDraft {
            source_id: self.source_id.clone(),
            fonte_nome: Some(self.fonte_nome.clone()),
            titulo: item.title().and_then(|t| text_or_none(t.to_string())),
            subtitulo,
            conteudo,
            imagem_url: item_image(item)?.and_then(|href| absolutize(base, &href)),
            fonte_url: item
                .link()
                .and_then(|l| text_or_none(l.to_string()))
                .or_else(|| item.guid().filter(|g| g.is_permalink()).map(|g| g.value().trim().to_string())),
            publicado_em: item.pub_date().and_then(parse_pub_date),
            feed_categorias: item
                .categories()
                .iter()
                .filter_map(|c| text_or_none(c.name().to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl SourceAdapter for RssNewsAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn crawlability(&self) -> Crawlability {
        Crawlability::Rss
    }

    fn parse(&self, page: &FetchedPage) -> Result<Vec<Draft>, AdapterError> {
        Ok(self
            .parse_feed(&page.body, &page.url)?
            .into_iter()
            .map(Draft::Noticia)
            .collect())
    }
}

pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Image enclosure first, then `media:content`/`media:thumbnail`, then the
/// first `<img>` inside the item HTML. Returned as written in the feed.
fn item_image(item: &Item) -> Result<Option<String>, AdapterError> {
    if let Some(enclosure) = item.enclosure() {
        if enclosure.mime_type().starts_with("image/") && !enclosure.url().trim().is_empty() {
            return Ok(Some(enclosure.url().trim().to_string()));
        }
    }
    if let Some(media) = item.extensions().get("media") {
        for name in ["content", "thumbnail"] {
            let url = media
                .get(name)
                .and_then(|exts| exts.iter().find_map(|ext| ext.attrs().get("url")))
                .and_then(|u| text_or_none(u.clone()));
            if url.is_some() {
                return Ok(url);
            }
        }
    }
    let img = selector("img")?;
    for html in [item.content(), item.description()].into_iter().flatten() {
        let doc = Html::parse_fragment(html);
        let src = doc
            .select(&img)
            .find_map(|n| n.value().attr("src"))
            .and_then(|s| text_or_none(s.to_string()));
        if src.is_some() {
            return Ok(src);
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Test</title>
    <link>https://example.com</link>
    <description>Test feed</description>
    <item>
      <title>Makhachev x Della Maddalena &amp;amp; mais</title>
      <link>https://example.com/a</link>
      <description><![CDATA[<p>Card <b>fechado</b></p>]]></description>
      <pubDate>Sat, 10 May 2025 18:30:00 GMT</pubDate>
      <media:thumbnail url="https://img.example.com/a.jpg"></media:thumbnail>
    </item>
    <item>
      <description>Sem título nem link</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn items_become_drafts_with_decoded_text() {
        let adapter = RssNewsAdapter::new("test", "Test");
        let drafts = adapter.parse_feed(FEED.as_bytes(), "https://example.com/feed").unwrap();
        assert_eq!(drafts.len(), 2);

        let first = &drafts[0];
        assert_eq!(first.titulo.as_deref(), Some("Makhachev x Della Maddalena & mais"));
        assert_eq!(first.subtitulo.as_deref(), Some("Card fechado"));
        assert_eq!(first.imagem_url.as_deref(), Some("https://img.example.com/a.jpg"));
        assert_eq!(
            first.publicado_em.map(|d| d.to_rfc3339()),
            Some("2025-05-10T18:30:00+00:00".to_string())
        );

        let second = &drafts[1];
        assert!(second.titulo.is_none());
        assert!(second.fonte_url.is_none());
        assert_eq!(second.fonte_nome.as_deref(), Some("Test"));
    }

    #[test]
    fn relative_images_are_resolved_against_the_item_link() {
        let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <link>https://www.ufc.com</link>
    <description>Test feed</description>
    <item>
      <title>Pereira x Ankalaev 2</title>
      <link>https://www.ufc.com/news/pereira-ankalaev-2</link>
      <enclosure url="/images/pereira.jpg" length="0" type="image/jpeg"/>
    </item>
    <item>
      <title>Sem link</title>
      <description><![CDATA[<img src="fotos/capa.png">]]></description>
    </item>
  </channel>
</rss>"#;
        let adapter = RssNewsAdapter::new("ufc", "UFC");
        let drafts = adapter.parse_feed(feed.as_bytes(), "https://www.ufc.com/rss/news").unwrap();
        assert_eq!(drafts[0].imagem_url.as_deref(), Some("https://www.ufc.com/images/pereira.jpg"));
        assert_eq!(drafts[1].imagem_url.as_deref(), Some("https://www.ufc.com/rss/fotos/capa.png"));
    }

    #[test]
    fn malformed_feed_is_an_error() {
        let adapter = RssNewsAdapter::new("test", "Test");
        assert!(matches!(adapter.parse_feed(b"<html>nope</html>", "https://example.com/feed"), Err(AdapterError::Feed(_))));
    }

    #[test]
    fn pub_dates_accept_rfc2822_and_rfc3339() {
        assert!(parse_pub_date("Tue, 06 May 2025 14:00:00 +0000").is_some());
        assert!(parse_pub_date("2025-05-06T14:00:00Z").is_some());
        assert!(parse_pub_date("ontem").is_none());
    }
}
