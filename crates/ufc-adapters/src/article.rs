//! Article page metadata, used to fill in what a feed item left out.

use scraper::Html;
use serde::{Deserialize, Serialize};
use ufc_core::NoticiaDraft;

use crate::{absolutize, select_first_attr, AdapterError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub titulo: Option<String>,
    pub descricao: Option<String>,
    pub imagem_url: Option<String>,
}

/// Reads Open Graph metadata; a relative image is resolved against `page_url`.
pub fn article_meta(html: &str, page_url: &str) -> Result<ArticleMeta, AdapterError> {
    let document = Html::parse_document(html);
    Ok(ArticleMeta {
        titulo: select_first_attr(&document, "meta[property='og:title']", "content")?,
        descricao: select_first_attr(&document, "meta[property='og:description']", "content")?
            .or(select_first_attr(&document, "meta[name='description']", "content")?),
        imagem_url: select_first_attr(&document, "meta[property='og:image']", "content")?
            .or(select_first_attr(&document, "meta[name='twitter:image']", "content")?)
            .and_then(|href| absolutize(page_url, &href)),
    })
}

impl ArticleMeta {
    /// Fills only the fields the draft is missing.
    pub fn fill(&self, draft: &mut NoticiaDraft) {
        if draft.imagem_url.is_none() {
            draft.imagem_url = self.imagem_url.clone();
        }
        if draft.subtitulo.is_none() {
            draft.subtitulo = self.descricao.clone();
        }
        if draft.titulo.is_none() {
            draft.titulo = self.titulo.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <meta property="og:title" content="Pereira recupera o cinturão">
        <meta name="description" content="Brasileiro vence por nocaute &amp; reassume o topo">
        <meta property="og:image" content="https://cdn.example.com/pereira.jpg">
    </head><body></body></html>"#;

    #[test]
    fn reads_open_graph_with_fallbacks() {
        let meta = article_meta(PAGE, "https://www.ufc.com/news/pereira").unwrap();
        assert_eq!(meta.titulo.as_deref(), Some("Pereira recupera o cinturão"));
        assert_eq!(meta.descricao.as_deref(), Some("Brasileiro vence por nocaute & reassume o topo"));
        assert_eq!(meta.imagem_url.as_deref(), Some("https://cdn.example.com/pereira.jpg"));
    }

    #[test]
    fn fill_keeps_what_the_feed_already_had() {
        let meta = article_meta(PAGE, "https://www.ufc.com/news/pereira").unwrap();
        let mut draft = NoticiaDraft {
            source_id: "x".into(),
            fonte_nome: None,
            titulo: Some("Título do feed".into()),
            subtitulo: None,
            conteudo: None,
            imagem_url: None,
            fonte_url: Some("https://example.com/a".into()),
            publicado_em: None,
            feed_categorias: Vec::new(),
        };
        meta.fill(&mut draft);
        assert_eq!(draft.titulo.as_deref(), Some("Título do feed"));
        assert_eq!(draft.imagem_url.as_deref(), Some("https://cdn.example.com/pereira.jpg"));
        assert!(draft.subtitulo.is_some());
    }

    #[test]
    fn relative_og_image_is_resolved_against_the_page() {
        let page = r#"<html><head><meta property="og:image" content="/images/capa.jpg"></head></html>"#;
        let meta = article_meta(page, "https://www.ufc.com/news/pereira-recupera").unwrap();
        assert_eq!(meta.imagem_url.as_deref(), Some("https://www.ufc.com/images/capa.jpg"));
    }
}
