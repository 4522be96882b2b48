//! Keyword rules from `rules/*.yaml`: news category and relevance filter.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use ufc_core::{NoticiaCategoria, NoticiaDraft};

#[derive(Debug, Clone, Deserialize)]
struct CategoriaRulesFile {
    #[allow(dead_code)]
    version: u32,
    #[serde(default)]
    rules: Vec<CategoriaRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoriaRule {
    pub categoria: NoticiaCategoria,
    pub contains_any: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejeicaoRules {
    #[allow(dead_code)]
    version: u32,
    #[serde(default)]
    pub min_title_chars: usize,
    #[serde(default)]
    pub required_any: Vec<String>,
    #[serde(default)]
    pub blocked_any: Vec<String>,
}

impl Default for RejeicaoRules {
    fn default() -> Self {
        Self {
            version: 1,
            min_title_chars: 0,
            required_any: Vec::new(),
            blocked_any: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingTitle,
    MissingLink,
    TitleTooShort,
    NotRelevant,
    Blocked(String),
}

impl Rejection {
    pub fn reason(&self) -> String {
        match self {
            Rejection::MissingTitle => "missing title".to_string(),
            Rejection::MissingLink => "missing link".to_string(),
            Rejection::TitleTooShort => "title too short".to_string(),
            Rejection::NotRelevant => "no required keyword".to_string(),
            Rejection::Blocked(word) => format!("blocked keyword {word:?}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub categorias: Vec<CategoriaRule>,
    pub rejeicao: RejeicaoRules,
}

impl RuleSet {
    pub fn load(rules_dir: impl AsRef<Path>) -> Result<Self> {
        let rules_dir = rules_dir.as_ref();
        let categorias: CategoriaRulesFile = serde_yaml::from_str(
            &std::fs::read_to_string(rules_dir.join("categorias.yaml"))
                .context("reading rules/categorias.yaml")?,
        )
        .context("parsing rules/categorias.yaml")?;
        let rejeicao: RejeicaoRules = serde_yaml::from_str(
            &std::fs::read_to_string(rules_dir.join("rejeicao.yaml"))
                .context("reading rules/rejeicao.yaml")?,
        )
        .context("parsing rules/rejeicao.yaml")?;
        Ok(Self {
            categorias: categorias.rules,
            rejeicao,
        })
    }

    /// First rule with a matching keyword wins; otherwise `fallback`.
    pub fn classify(&self, draft: &NoticiaDraft, fallback: NoticiaCategoria) -> NoticiaCategoria {
        let haystack = haystack(draft);
        self.categorias
            .iter()
            .find(|rule| contains_any(&haystack, &rule.contains_any).is_some())
            .map(|rule| rule.categoria)
            .unwrap_or(fallback)
    }

    pub fn rejection(&self, draft: &NoticiaDraft, require_keywords: bool) -> Option<Rejection> {
        let Some(titulo) = draft.titulo.as_deref() else {
            return Some(Rejection::MissingTitle);
        };
        if draft.fonte_url.is_none() {
            return Some(Rejection::MissingLink);
        }
        if titulo.chars().count() < self.rejeicao.min_title_chars {
            return Some(Rejection::TitleTooShort);
        }
        let haystack = haystack(draft);
        if let Some(word) = contains_any(&haystack, &self.rejeicao.blocked_any) {
            return Some(Rejection::Blocked(word.to_string()));
        }
        if require_keywords
            && !self.rejeicao.required_any.is_empty()
            && contains_any(&haystack, &self.rejeicao.required_any).is_none()
        {
            return Some(Rejection::NotRelevant);
        }
        None
    }
}

/// Title, subtitle and the feed's own labels, lowercased.
fn haystack(draft: &NoticiaDraft) -> String {
    let mut parts = vec![
        draft.titulo.as_deref().unwrap_or_default(),
        draft.subtitulo.as_deref().unwrap_or_default(),
    ];
    parts.extend(draft.feed_categorias.iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}

fn contains_any<'a>(haystack: &str, needles: &'a [String]) -> Option<&'a str> {
    needles
        .iter()
        .map(String::as_str)
        .find(|needle| !needle.is_empty() && haystack.contains(&needle.to_lowercase()))
}
