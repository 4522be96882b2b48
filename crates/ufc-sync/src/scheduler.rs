use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::SyncPipeline;

/// Cron-driven news sync; `None` unless `UFC_SCHEDULER_ENABLED` is set. The
/// caller starts the returned scheduler.
pub async fn maybe_build_scheduler(pipeline: Arc<SyncPipeline>, pool: PgPool) -> Result<Option<JobScheduler>> {
    if !pipeline.config().scheduler_enabled {
        return Ok(None);
    }

    let cron = pipeline.config().sync_cron.clone();
    let sched = JobScheduler::new().await.context("creating scheduler")?;
    let job = Job::new_async(cron.as_str(), move |_uuid, _l| {
        let pipeline = Arc::clone(&pipeline);
        let pool = pool.clone();
        Box::pin(async move {
            match pipeline.sync_news(&pool).await {
                Ok(report) => info!(added = report.added, processed = report.processed, "scheduled sync finished"),
                Err(err) => warn!(error = %format!("{err:#}"), "scheduled sync failed"),
            }
        })
    })
    .with_context(|| format!("creating scheduler job for cron {cron}"))?;
    sched.add(job).await.context("adding scheduler job")?;
    Ok(Some(sched))
}
