//! Raw page archive, polite HTTP fetching and the Postgres content store.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::{header, StatusCode};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

pub mod db;

pub const CRATE_NAME: &str = "ufc-storage";

#[derive(Debug, Clone)]
pub struct ArchivedPage {
    pub content_hash: String,
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    pub byte_size: usize,
    pub deduplicated: bool,
}

/// Hash-addressed archive of every fetched feed and page, one directory per
/// day and source.
#[derive(Debug, Clone)]
pub struct RawArchive {
    root: PathBuf,
}

impl RawArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    pub fn extension_for(content_type: &str) -> &'static str {
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        match mime {
            "text/html" => "html",
            "application/rss+xml" | "application/xml" | "text/xml" | "application/atom+xml" => "xml",
            "application/json" => "json",
            _ => "bin",
        }
    }

    pub fn relative_path_for(
        &self,
        fetched_at: DateTime<Utc>,
        source_id: &str,
        content_hash: &str,
        extension: &str,
    ) -> PathBuf {
        PathBuf::from(fetched_at.format("%Y-%m-%d").to_string())
            .join(source_id)
            .join(format!("{content_hash}.{extension}"))
    }

    /// Writes through a temp file + rename; identical bytes on the same day
    /// resolve to the same path and are not rewritten.
    pub async fn archive(
        &self,
        fetched_at: DateTime<Utc>,
        source_id: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> anyhow::Result<ArchivedPage> {
        let content_hash = Self::sha256_hex(bytes);
        let relative_path = self.relative_path_for(
            fetched_at,
            source_id,
            &content_hash,
            Self::extension_for(content_type),
        );
        let absolute_path = self.root.join(&relative_path);
        let page = |deduplicated| ArchivedPage {
            content_hash: content_hash.clone(),
            relative_path: relative_path.clone(),
            absolute_path: absolute_path.clone(),
            byte_size: bytes.len(),
            deduplicated,
        };

        let Some(dir) = absolute_path.parent() else {
            anyhow::bail!("archive path {} has no parent", absolute_path.display());
        };
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating archive directory {}", dir.display()))?;

        if fs::try_exists(&absolute_path)
            .await
            .with_context(|| format!("checking archive path {}", absolute_path.display()))?
        {
            return Ok(page(true));
        }

        let temp_path = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        let mut file = fs::File::create(&temp_path)
            .await
            .with_context(|| format!("creating {}", temp_path.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("writing {}", temp_path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flushing {}", temp_path.display()))?;
        drop(file);

        if let Err(err) = fs::rename(&temp_path, &absolute_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(err).with_context(|| {
                format!(
                    "renaming {} -> {}",
                    temp_path.display(),
                    absolute_path.display()
                )
            });
        }
        Ok(page(false))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retryable,
    NonRetryable,
}

pub fn classify_status(status: StatusCode) -> RetryDisposition {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> RetryDisposition {
    if err.is_timeout() || err.is_connect() {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    /// Scripts fail fast: a failed fetch is logged and the run exits non-zero.
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Minimum gap between two requests from the same fetcher.
    pub min_interval: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: "ufc-news-bot/0.1".to_string(),
            min_interval: Duration::from_millis(500),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Spaces consecutive requests so scrapers stay polite to the remote site.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub async fn wait_turn(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub final_url: String,
    pub content_type: String,
    pub body: Vec<u8>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    pacer: RequestPacer,
    backoff: BackoffPolicy,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            client,
            pacer: RequestPacer::new(config.min_interval),
            backoff: config.backoff,
        })
    }

    pub async fn fetch(&self, source_id: &str, url: &str) -> Result<FetchedResponse, FetchError> {
        let span = info_span!("http_fetch", source_id, url);
        self.fetch_with_retries(url).instrument(span).await
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<FetchedResponse, FetchError> {
        let mut attempt = 0;
        loop {
            self.pacer.wait_turn().await;
            let outcome = match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let status = resp.status();
                    let final_url = resp.url().to_string();
                    let content_type = resp
                        .headers()
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let body = resp.bytes().await.map_err(|source| FetchError::Request {
                        url: final_url.clone(),
                        source,
                    })?;
                    return Ok(FetchedResponse {
                        status,
                        final_url,
                        content_type,
                        body: body.to_vec(),
                        fetched_at: Utc::now(),
                    });
                }
                Ok(resp) => {
                    let status = resp.status();
                    let err = FetchError::HttpStatus {
                        status: status.as_u16(),
                        url: resp.url().to_string(),
                    };
                    (classify_status(status), err)
                }
                Err(source) => {
                    let disposition = classify_reqwest_error(&source);
                    let err = FetchError::Request {
                        url: url.to_string(),
                        source,
                    };
                    (disposition, err)
                }
            };

            let (disposition, err) = outcome;
            if disposition == RetryDisposition::NonRetryable || attempt >= self.backoff.max_retries {
                return Err(err);
            }
            let delay = self.backoff.delay_for_attempt(attempt);
            warn!(attempt, ?delay, error = %err, "retrying fetch");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn archive_hashing_is_stable() {
        assert_eq!(
            RawArchive::sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn content_types_map_to_extensions() {
        assert_eq!(RawArchive::extension_for("application/rss+xml; charset=utf-8"), "xml");
        assert_eq!(RawArchive::extension_for("text/html"), "html");
        assert_eq!(RawArchive::extension_for(""), "bin");
    }

    #[tokio::test]
    async fn identical_pages_are_archived_once_per_day() {
        let dir = tempdir().expect("tempdir");
        let archive = RawArchive::new(dir.path());
        let fetched_at = DateTime::parse_from_rfc3339("2025-05-10T12:00:00Z")
            .expect("ts")
            .with_timezone(&Utc);

        let first = archive
            .archive(fetched_at, "mma-fighting", "application/rss+xml", b"<rss/>")
            .await
            .expect("first archive");
        let second = archive
            .archive(fetched_at, "mma-fighting", "application/rss+xml", b"<rss/>")
            .await
            .expect("second archive");

        assert!(!first.deduplicated);
        assert!(second.deduplicated);
        assert_eq!(first.relative_path, second.relative_path);
        assert!(first.relative_path.starts_with("2025-05-10/mma-fighting"));
        assert!(first.absolute_path.exists());
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let policy = BackoffPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for_attempt(9), Duration::from_millis(350));
    }

    #[test]
    fn only_server_side_statuses_are_retryable() {
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY), RetryDisposition::Retryable);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), RetryDisposition::Retryable);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), RetryDisposition::NonRetryable);
    }

    #[tokio::test]
    async fn pacer_spaces_requests() {
        let pacer = RequestPacer::new(Duration::from_millis(40));
        let start = Instant::now();
        pacer.wait_turn().await;
        pacer.wait_turn().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
