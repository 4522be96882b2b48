use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};
use ufc_adapters::{adapter_for, article_meta, Draft, SourceKind};
use ufc_core::images::ImageHostPolicy;
use ufc_core::slug::tipo_from_slug;
use ufc_core::text::normalize_title;
use ufc_core::{NoticiaCategoria, NoticiaDraft};
use ufc_storage::db::{eventos, lutadores, noticias};
use ufc_storage::{BackoffPolicy, FetchConfig, HttpFetcher, RawArchive};
use uuid::Uuid;

use crate::dedup::{normalize_url, DedupConfig, DedupEngine, DuplicateOf};
use crate::rules::{Rejection, RuleSet};
use crate::{SourceConfig, SourceRegistry, SyncConfig};

/// Outcome of one news sync. `processed == added + duplicates + rejected`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub processed: u64,
    pub added: u64,
    pub duplicates: u64,
    pub rejected: u64,
    pub linked_fighters: u64,
    pub failed_sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeReport {
    pub processed: u64,
    pub upserted: u64,
    pub skipped: u64,
    pub failed: u64,
    pub failed_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    Duplicate(DuplicateOf),
    Rejected(Rejection),
}

/// A feed item that passed the relevance and duplicate checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screened {
    pub titulo: String,
    pub fonte_url: String,
}

pub fn screen(
    draft: &NoticiaDraft,
    source: &SourceConfig,
    rules: &RuleSet,
    dedup: &mut DedupEngine,
) -> Result<Screened, Skip> {
    if let Some(rejection) = rules.rejection(draft, source.require_keywords) {
        return Err(Skip::Rejected(rejection));
    }
    let (Some(titulo), Some(link)) = (draft.titulo.as_deref(), draft.fonte_url.as_deref()) else {
        return Err(Skip::Rejected(Rejection::MissingLink));
    };
    let fonte_url = normalize_url(link);
    if let Some(dup) = dedup.check(&fonte_url, titulo) {
        return Err(Skip::Duplicate(dup));
    }
    Ok(Screened {
        titulo: titulo.to_string(),
        fonte_url,
    })
}

pub fn build_noticia(
    draft: NoticiaDraft,
    screened: Screened,
    source: &SourceConfig,
    rules: &RuleSet,
    images: &ImageHostPolicy,
) -> noticias::NovaNoticia {
    let categoria = rules.classify(&draft, source.categoria_padrao.unwrap_or(NoticiaCategoria::Geral));
    noticias::NovaNoticia {
        titulo: screened.titulo,
        subtitulo: draft.subtitulo,
        conteudo: draft.conteudo,
        imagem_url: images.filter(draft.imagem_url),
        fonte_url: screened.fonte_url,
        fonte_nome: draft.fonte_nome.or_else(|| Some(source.display_name.clone())),
        categoria,
        publicado_em: draft.publicado_em,
    }
}

/// Fighters whose full name appears as whole words in `text`. Single-word
/// names are ignored; they match too much.
pub fn fighters_mentioned(text: &str, fighters: &[(Uuid, String)]) -> Vec<Uuid> {
    let haystack = format!(" {} ", normalize_title(text));
    fighters
        .iter()
        .filter_map(|(id, nome)| {
            let needle = normalize_title(nome);
            (needle.split(' ').count() >= 2 && haystack.contains(&format!(" {needle} "))).then_some(*id)
        })
        .collect()
}

pub struct SyncPipeline {
    config: SyncConfig,
    archive: RawArchive,
    http: HttpFetcher,
    rules: RuleSet,
    dedup: DedupConfig,
    run_lock: Mutex<()>,
}

impl SyncPipeline {
    pub fn new(config: SyncConfig) -> Result<Self> {
        let rules = RuleSet::load(config.rules_dir())?;
        let http = HttpFetcher::new(FetchConfig {
            timeout: Duration::from_secs(config.http_timeout_secs),
            user_agent: config.user_agent.clone(),
            backoff: BackoffPolicy {
                max_retries: config.http_max_retries,
                ..Default::default()
            },
            ..Default::default()
        })?;
        Ok(Self {
            archive: RawArchive::new(config.artifacts_dir.clone()),
            config,
            http,
            rules,
            dedup: DedupConfig::default(),
            run_lock: Mutex::new(()),
        })
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn http(&self) -> &HttpFetcher {
        &self.http
    }

    async fn registry(&self) -> Result<SourceRegistry> {
        SourceRegistry::load(self.config.sources_path()).await
    }

    /// Fetches, archives and parses one source. Archive failures are logged
    /// and do not fail the source.
    async fn fetch_source(&self, source: &SourceConfig) -> Result<Vec<Draft>> {
        let adapter = adapter_for(source.kind, &source.source_id, &source.display_name);
        let pages = adapter
            .fetch(&self.http, &source.urls)
            .await
            .with_context(|| format!("fetching {}", source.source_id))?;
        let mut drafts = Vec::new();
        for page in &pages {
            if let Err(err) = self
                .archive
                .archive(page.fetched_at, &source.source_id, &page.content_type, &page.body)
                .await
            {
                warn!(source_id = %source.source_id, url = %page.url, error = %err, "archiving page failed");
            }
            drafts.extend(
                adapter
                    .parse(page)
                    .with_context(|| format!("parsing {} from {}", source.source_id, page.url))?,
            );
        }
        Ok(drafts)
    }

    /// RSS ingestion; one run at a time per pipeline.
    pub async fn sync_news(&self, pool: &PgPool) -> Result<SyncReport> {
        let _running = self.run_lock.lock().await;
        let registry = self.registry().await?;
        let mut report = SyncReport::default();

        let mut batches: Vec<(&SourceConfig, Vec<NoticiaDraft>)> = Vec::new();
        for source in registry.enabled(SourceKind::Rss) {
            let span = info_span!("sync_source", source_id = %source.source_id);
            match self.fetch_source(source).instrument(span).await {
                Ok(drafts) => {
                    let items = drafts
                        .into_iter()
                        .filter_map(|d| match d {
                            Draft::Noticia(n) => Some(n),
                            _ => None,
                        })
                        .collect();
                    batches.push((source, items));
                }
                Err(err) => {
                    warn!(source_id = %source.source_id, error = %format!("{err:#}"), "source failed");
                    report.failed_sources.push(source.source_id.clone());
                }
            }
        }

        let candidate_urls: Vec<String> = batches
            .iter()
            .flat_map(|(_, items)| items.iter())
            .filter_map(|d| d.fonte_url.as_deref().map(normalize_url))
            .collect();
        let stored = noticias::existing_urls(pool, &candidate_urls)
            .await
            .context("loading stored news urls")?;
        let recent = noticias::titles_since(pool, Utc::now() - chrono::Duration::days(self.dedup.window_days))
            .await
            .context("loading recent news titles")?;
        let mut dedup = DedupEngine::new(self.dedup, stored, recent);
        let fighters: Vec<(Uuid, String)> = lutadores::list_all(pool)
            .await
            .context("loading fighters")?
            .into_iter()
            .map(|l| (l.id, l.nome))
            .collect();

        for (source, items) in batches {
            for mut draft in items {
                report.processed += 1;
                let screened = match screen(&draft, source, &self.rules, &mut dedup) {
                    Ok(screened) => screened,
                    Err(Skip::Rejected(rejection)) => {
                        report.rejected += 1;
                        debug!(source_id = %source.source_id, titulo = ?draft.titulo, reason = %rejection.reason(), "rejected");
                        continue;
                    }
                    Err(Skip::Duplicate(dup)) => {
                        report.duplicates += 1;
                        debug!(source_id = %source.source_id, titulo = ?draft.titulo, ?dup, "duplicate");
                        continue;
                    }
                };

                if draft.imagem_url.is_none() && self.config.enrich_articles {
                    self.enrich(&source.source_id, &screened.fonte_url, &mut draft).await;
                }
                let nova = build_noticia(draft, screened, source, &self.rules, &self.config.image_hosts);
                match noticias::insert_if_new(pool, &nova).await? {
                    Some(noticia) => {
                        report.added += 1;
                        info!(id = %noticia.id, categoria = %noticia.categoria, titulo = %noticia.titulo, "added");
                        let text = format!("{} {}", noticia.titulo, noticia.subtitulo.as_deref().unwrap_or_default());
                        let ids = fighters_mentioned(&text, &fighters);
                        report.linked_fighters += noticias::link_lutadores(pool, noticia.id, &ids).await?;
                    }
                    None => report.duplicates += 1,
                }
            }
        }

        info!(
            processed = report.processed,
            added = report.added,
            duplicates = report.duplicates,
            rejected = report.rejected,
            failed_sources = report.failed_sources.len(),
            "news sync finished"
        );
        Ok(report)
    }

    async fn enrich(&self, source_id: &str, url: &str, draft: &mut NoticiaDraft) {
        let meta = match self.http.fetch(source_id, url).await {
            Ok(resp) => article_meta(&String::from_utf8_lossy(&resp.body), &resp.final_url),
            Err(err) => {
                warn!(url, error = %err, "article fetch failed");
                return;
            }
        };
        match meta {
            Ok(meta) => meta.fill(draft),
            Err(err) => warn!(url, error = %err, "article parse failed"),
        }
    }

    pub async fn scrape_events(&self, pool: &PgPool) -> Result<ScrapeReport> {
        let registry = self.registry().await?;
        let mut report = ScrapeReport::default();
        for source in registry.enabled(SourceKind::EventList) {
            let drafts = match self.fetch_source(source).await {
                Ok(drafts) => drafts,
                Err(err) => {
                    warn!(source_id = %source.source_id, error = %format!("{err:#}"), "source failed");
                    report.failed_sources.push(source.source_id.clone());
                    continue;
                }
            };
            for draft in drafts {
                let Draft::Evento(evento) = draft else { continue };
                report.processed += 1;
                let Some(data) = evento.data else {
                    report.skipped += 1;
                    warn!(slug = %evento.slug, "event without date skipped");
                    continue;
                };
                match eventos::upsert_draft(pool, &evento, data, tipo_from_slug(&evento.slug)).await {
                    Ok(row) => {
                        report.upserted += 1;
                        info!(slug = %row.slug, nome = %row.nome, tipo = %row.tipo, "event upserted");
                    }
                    Err(err) => {
                        report.failed += 1;
                        warn!(slug = %evento.slug, error = %err, "event upsert failed");
                    }
                }
            }
        }
        Ok(report)
    }

    pub async fn scrape_fighters(&self, pool: &PgPool) -> Result<ScrapeReport> {
        let registry = self.registry().await?;
        let mut report = ScrapeReport::default();
        for source in registry.enabled(SourceKind::FighterList) {
            let drafts = match self.fetch_source(source).await {
                Ok(drafts) => drafts,
                Err(err) => {
                    warn!(source_id = %source.source_id, error = %format!("{err:#}"), "source failed");
                    report.failed_sources.push(source.source_id.clone());
                    continue;
                }
            };
            for draft in drafts {
                let Draft::Lutador(lutador) = draft else { continue };
                report.processed += 1;
                match lutadores::upsert_draft(pool, &lutador).await {
                    Ok(row) => {
                        report.upserted += 1;
                        info!(slug = %row.slug, nome = %row.nome, "fighter upserted");
                    }
                    Err(err) => {
                        report.failed += 1;
                        warn!(slug = %lutador.slug, error = %err, "fighter upsert failed");
                    }
                }
            }
        }
        Ok(report)
    }
}
