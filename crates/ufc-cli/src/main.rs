use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ufc_client::{CachedClient, ClientConfig, Fingerprint, FingerprintInputs, Poller, UfcApi};
use ufc_core::RankingPrevisor;
use ufc_storage::db::PgPool;
use ufc_sync::maintenance::{self, MaintenanceReport};
use ufc_sync::{ScrapeReport, SyncConfig, SyncPipeline};
use ufc_web::{AppState, WebConfig};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "ufc-cli")]
#[command(about = "UFC news site: server, ingestion and maintenance scripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the web server (and the sync scheduler when enabled).
    Serve,
    /// Apply database migrations.
    Migrate,
    /// Ingest the configured RSS feeds.
    Sync,
    ScrapeEvents,
    ScrapeFighters,
    /// Decode HTML entities left in stored text.
    DecodeEntities,
    /// Split quoted nicknames out of fighter names.
    CleanNames,
    /// Fix event names and types from their slugs.
    NormalizeEvents,
    /// Delete duplicate news, keeping the oldest row.
    DedupeNews,
    /// Delete an event with its fights and predictions.
    DeleteEvent { slug: String },
    RecomputeRankings,
    /// Create or update an admin account.
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "Admin")]
        nome: String,
        #[arg(long, env = "UFC_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print the prediction leaderboard from the API.
    Ranking {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        /// Keep refreshing until Ctrl-C.
        #[arg(long)]
        watch: bool,
    },
    /// Submit a prediction under this machine's fingerprint.
    Prever {
        luta_id: Uuid,
        vencedor_id: Uuid,
        #[arg(long)]
        metodo: Option<String>,
        #[arg(long)]
        round: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve().await?,
        Commands::Migrate => {
            let pool = connect_from_env().await?;
            ufc_storage::db::migrate(&pool).await.context("running migrations")?;
            println!("migrations applied");
        }
        Commands::Sync => {
            let pool = connect_from_env().await?;
            let pipeline = SyncPipeline::new(SyncConfig::from_env())?;
            let report = pipeline.sync_news(&pool).await?;
            println!(
                "sync complete: processed={} added={} duplicates={} rejected={} linked_fighters={}",
                report.processed, report.added, report.duplicates, report.rejected, report.linked_fighters
            );
            fail_on_sources(&report.failed_sources)?;
        }
        Commands::ScrapeEvents => {
            let pool = connect_from_env().await?;
            let pipeline = SyncPipeline::new(SyncConfig::from_env())?;
            finish_scrape("events", pipeline.scrape_events(&pool).await?)?;
        }
        Commands::ScrapeFighters => {
            let pool = connect_from_env().await?;
            let pipeline = SyncPipeline::new(SyncConfig::from_env())?;
            finish_scrape("fighters", pipeline.scrape_fighters(&pool).await?)?;
        }
        Commands::DecodeEntities => {
            let pool = connect_from_env().await?;
            finish_maintenance("decode-entities", maintenance::decode_entities_all(&pool).await?)?;
        }
        Commands::CleanNames => {
            let pool = connect_from_env().await?;
            finish_maintenance("clean-names", maintenance::clean_names(&pool).await?)?;
        }
        Commands::NormalizeEvents => {
            let pool = connect_from_env().await?;
            finish_maintenance("normalize-events", maintenance::normalize_events(&pool).await?)?;
        }
        Commands::DedupeNews => {
            let pool = connect_from_env().await?;
            finish_maintenance("dedupe-news", maintenance::dedupe_news(&pool).await?)?;
        }
        Commands::DeleteEvent { slug } => {
            let pool = connect_from_env().await?;
            let Some(summary) = maintenance::delete_event(&pool, &slug).await? else {
                bail!("event {slug} not found");
            };
            println!(
                "deleted {slug}: previsoes={} rankings_atualizados={} lutas={} comentarios={} analises_desvinculadas={}",
                summary.previsoes,
                summary.rankings_atualizados,
                summary.lutas,
                summary.comentarios,
                summary.analises_desvinculadas
            );
        }
        Commands::RecomputeRankings => {
            let pool = connect_from_env().await?;
            let rows = maintenance::recompute_rankings(&pool).await?;
            println!("ranking rebuilt: {rows} forecasters");
        }
        Commands::CreateAdmin { email, nome, password } => {
            let email = email.trim().to_lowercase();
            if email.is_empty() || password.len() < 8 {
                bail!("email is required and the password needs at least 8 characters");
            }
            let pool = connect_from_env().await?;
            let hash = ufc_web::auth::hash_password(&password)?;
            let usuario = ufc_storage::db::usuarios::upsert(&pool, &email, nome.trim(), &hash)
                .await
                .context("saving admin")?;
            println!("admin ready: {} ({})", usuario.email, usuario.id);
        }
        Commands::Ranking { limit, watch } => ranking(limit, watch).await?,
        Commands::Prever {
            luta_id,
            vencedor_id,
            metodo,
            round,
        } => {
            let config = ClientConfig::from_env();
            let fingerprint = Fingerprint::load_or_create(&config.fingerprint_file, || {
                FingerprintInputs::from_environment(&config.user_agent)
            })
            .await?;
            let api = UfcApi::new(Arc::new(CachedClient::new(&config)?));
            let previsao = api
                .predict(&fingerprint, luta_id, vencedor_id, metodo, round)
                .await?;
            println!("{}", serde_json::to_string_pretty(&previsao)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();
}

async fn serve() -> Result<()> {
    let web_config = WebConfig::from_env().context("loading web config")?;
    let sync_config = SyncConfig::from_env();
    let pool = ufc_storage::db::connect(&sync_config.database_url)
        .await
        .context("connecting to postgres")?;
    ufc_storage::db::migrate(&pool).await.context("running migrations")?;

    let pipeline = Arc::new(SyncPipeline::new(sync_config)?);
    let scheduler = ufc_sync::scheduler::maybe_build_scheduler(pipeline.clone(), pool.clone()).await?;
    if let Some(scheduler) = &scheduler {
        scheduler.start().await.context("starting sync scheduler")?;
        info!("sync scheduler running");
    }

    let state = AppState::new(pool, web_config, pipeline);
    ufc_web::serve(state).await
}

async fn ranking(limit: i64, watch: bool) -> Result<()> {
    let config = ClientConfig::from_env();
    let client = Arc::new(CachedClient::new(&config)?);
    if !watch {
        let board = UfcApi::new(client).ranking(limit).await?;
        print_ranking(&board.value);
        return Ok(());
    }

    let handle = Poller::leaderboard(client, limit).spawn(|board: ufc_client::Cached<Vec<RankingPrevisor>>| {
        print_ranking(&board.value);
    });
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    handle.cancel().await;
    Ok(())
}

fn print_ranking(rows: &[RankingPrevisor]) {
    println!("{:>3}  {:<20} {:>6} {:>6} {:>8}", "#", "previsor", "pontos", "acertos", "precisao");
    for (pos, row) in rows.iter().enumerate() {
        let nome = row
            .apelido
            .clone()
            .unwrap_or_else(|| row.fingerprint.chars().take(8).collect());
        println!(
            "{:>3}  {:<20} {:>6} {:>3}/{:<3} {:>7.1}%",
            pos + 1,
            nome,
            row.pontos,
            row.acertos,
            row.total_previsoes,
            row.precisao
        );
    }
}

fn fail_on_sources(failed: &[String]) -> Result<()> {
    if failed.is_empty() {
        Ok(())
    } else {
        bail!("sources failed: {}", failed.join(", "))
    }
}

fn finish_scrape(what: &str, report: ScrapeReport) -> Result<()> {
    println!(
        "{what} scrape complete: processed={} upserted={} skipped={} failed={}",
        report.processed, report.upserted, report.skipped, report.failed
    );
    if report.failed > 0 {
        bail!("{} {what} could not be saved", report.failed);
    }
    fail_on_sources(&report.failed_sources)
}

fn finish_maintenance(script: &str, report: MaintenanceReport) -> Result<()> {
    println!(
        "{script}: examined={} updated={} failed={}",
        report.examined, report.updated, report.failed
    );
    if report.failed > 0 {
        bail!("{script}: {} rows failed", report.failed);
    }
    Ok(())
}

async fn connect_from_env() -> Result<PgPool> {
    let url = SyncConfig::from_env().database_url;
    ufc_storage::db::connect(&url).await.context("connecting to postgres")
}
