use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::ClientConfig;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },
    #[error("unexpected payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// How a cached read was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Served from the cache without a request.
    Fresh,
    /// Fetched from the server just now.
    Revalidated,
    /// Revalidation failed and the previous value was served instead.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub freshness: Freshness,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    fetched_at: Instant,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// JSON GETs through a per-URL cache with stale-while-revalidate semantics.
#[derive(Debug)]
pub struct CachedClient {
    http: reqwest::Client,
    base_url: String,
    dedupe_interval: Duration,
    cache_ttl: Duration,
    cache_capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CachedClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            dedupe_interval: config.dedupe_interval,
            cache_ttl: config.cache_ttl,
            cache_capacity: config.cache_capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Cached<T>, ClientError> {
        let url = self.url(path);
        let cached = self.entries.lock().await.get(&url).cloned();
        if let Some(entry) = &cached {
            if entry.fetched_at.elapsed() < self.dedupe_interval {
                debug!(url = %url, "cache hit");
                return decode(&url, entry.value.clone(), Freshness::Fresh);
            }
        }

        match self.fetch(&url).await {
            Ok(value) => {
                self.store(
                    url.clone(),
                    CacheEntry {
                        value: value.clone(),
                        fetched_at: Instant::now(),
                    },
                )
                .await;
                decode(&url, value, Freshness::Revalidated)
            }
            Err(err) => match cached {
                Some(entry) => {
                    warn!(url = %url, error = %err, "revalidation failed, serving stale value");
                    decode(&url, entry.value, Freshness::Stale)
                }
                None => Err(err),
            },
        }
    }

    /// Uncached POST. Callers invalidate whatever reads the write affects.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Request {
                url: url.clone(),
                source,
            })?;
        let value = read_json(&url, resp).await?;
        serde_json::from_value(value).map_err(|source| ClientError::Decode { url, source })
    }

    /// Drops every cached entry whose path starts with `prefix`.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let prefix = self.url(prefix);
        self.entries.lock().await.retain(|url, _| !url.starts_with(&prefix));
    }

    /// Number of URLs currently cached.
    pub async fn cached_entries(&self) -> usize {
        self.entries.lock().await.len()
    }

    async fn store(&self, url: String, entry: CacheEntry) {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, e| *key == url || e.fetched_at.elapsed() < self.cache_ttl);
        while !entries.contains_key(&url) && entries.len() >= self.cache_capacity {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.fetched_at)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            entries.remove(&oldest);
        }
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, "dropped old cache entries");
        }
        entries.insert(url, entry);
    }

    async fn fetch(&self, url: &str) -> Result<serde_json::Value, ClientError> {
        let resp = self.http.get(url).send().await.map_err(|source| ClientError::Request {
            url: url.to_string(),
            source,
        })?;
        read_json(url, resp).await
    }
}

async fn read_json(url: &str, resp: reqwest::Response) -> Result<serde_json::Value, ClientError> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(|source| ClientError::Request {
        url: url.to_string(),
        source,
    })?;
    if !status.is_success() {
        return Err(api_error(url, status, &bytes));
    }
    serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}

fn api_error(url: &str, status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("erro").to_string());
    ClientError::Api {
        status: status.as_u16(),
        url: url.to_string(),
        message,
    }
}

fn decode<T: DeserializeOwned>(url: &str, value: serde_json::Value, freshness: Freshness) -> Result<Cached<T>, ClientError> {
    let value = serde_json::from_value(value).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })?;
    Ok(Cached { value, freshness })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_server;
    use std::sync::atomic::Ordering;
    use ufc_core::RankingPrevisor;

    fn client(base_url: &str, dedupe: Duration) -> CachedClient {
        let config = ClientConfig {
            api_url: base_url.to_string(),
            dedupe_interval: dedupe,
            ..ClientConfig::default()
        };
        CachedClient::new(&config).unwrap()
    }

    fn bounded_client(base_url: &str, ttl: Duration, capacity: usize) -> CachedClient {
        let config = ClientConfig {
            api_url: base_url.to_string(),
            dedupe_interval: Duration::from_secs(60),
            cache_ttl: ttl,
            cache_capacity: capacity,
            ..ClientConfig::default()
        };
        CachedClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn fresh_entries_skip_the_network() {
        let server = spawn_server().await;
        let client = client(&server.base_url, Duration::from_secs(60));

        let first: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking").await.unwrap();
        let second: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking").await.unwrap();

        assert_eq!(first.freshness, Freshness::Revalidated);
        assert_eq!(second.freshness, Freshness::Fresh);
        assert_eq!(second.value, first.value);
        assert_eq!(server.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_entries_are_revalidated() {
        let server = spawn_server().await;
        let client = client(&server.base_url, Duration::ZERO);

        let first: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking").await.unwrap();
        let second: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking").await.unwrap();

        assert_eq!(second.freshness, Freshness::Revalidated);
        assert_eq!(first.value[0].pontos, 1);
        assert_eq!(second.value[0].pontos, 2);
    }

    #[tokio::test]
    async fn failed_revalidation_serves_the_stale_value() {
        let server = spawn_server().await;
        let client = client(&server.base_url, Duration::ZERO);

        let first: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking").await.unwrap();
        server.healthy.store(false, Ordering::SeqCst);
        let second: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking").await.unwrap();

        assert_eq!(second.freshness, Freshness::Stale);
        assert_eq!(second.value, first.value);
    }

    #[tokio::test]
    async fn errors_without_a_cached_value_surface_the_api_message() {
        let server = spawn_server().await;
        server.healthy.store(false, Ordering::SeqCst);
        let client = client(&server.base_url, Duration::ZERO);

        let err = client.get_json::<Vec<RankingPrevisor>>("/api/ranking").await.unwrap_err();
        match err {
            ClientError::Api { status, message, .. } => {
                assert_eq!(status, 500);
                assert_eq!(message, "erro interno");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn invalidation_forces_a_refetch() {
        let server = spawn_server().await;
        let client = client(&server.base_url, Duration::from_secs(60));

        let _: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking").await.unwrap();
        client.invalidate_prefix("/api/rank").await;
        let again: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking").await.unwrap();

        assert_eq!(again.freshness, Freshness::Revalidated);
        assert_eq!(server.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_insert() {
        let server = spawn_server().await;
        let client = bounded_client(&server.base_url, Duration::from_millis(50), 256);

        for limit in 0..5 {
            let _: Cached<Vec<RankingPrevisor>> = client.get_json(&format!("/api/ranking?limit={limit}")).await.unwrap();
        }
        assert_eq!(client.cached_entries().await, 5);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let _: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking?limit=99").await.unwrap();
        assert_eq!(client.cached_entries().await, 1);
    }

    #[tokio::test]
    async fn distinct_urls_never_exceed_the_capacity() {
        let server = spawn_server().await;
        let client = bounded_client(&server.base_url, Duration::from_secs(600), 3);

        for limit in 0..10 {
            let _: Cached<Vec<RankingPrevisor>> = client.get_json(&format!("/api/ranking?limit={limit}")).await.unwrap();
        }
        assert_eq!(client.cached_entries().await, 3);

        let newest: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking?limit=9").await.unwrap();
        assert_eq!(newest.freshness, Freshness::Fresh);
        let oldest: Cached<Vec<RankingPrevisor>> = client.get_json("/api/ranking?limit=0").await.unwrap();
        assert_eq!(oldest.freshness, Freshness::Revalidated);
    }
}
