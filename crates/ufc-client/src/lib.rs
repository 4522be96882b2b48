//! HTTP client side of the site: a revalidating JSON cache, interval
//! pollers and the anonymous prediction fingerprint.

use std::path::PathBuf;
use std::time::Duration;

pub mod api;
pub mod cache;
pub mod fingerprint;
pub mod poller;

#[cfg(test)]
mod testing;

pub use api::{PrevisaoRequest, UfcApi};
pub use cache::{Cached, CachedClient, ClientError, Freshness};
pub use fingerprint::{Fingerprint, FingerprintInputs};
pub use poller::{Poller, PollerHandle, EVENTS_INTERVAL, LEADERBOARD_INTERVAL};

pub const CRATE_NAME: &str = "ufc-client";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    /// Cached responses younger than this are served without a request.
    pub dedupe_interval: Duration,
    /// Entries older than this are dropped on the next insert.
    pub cache_ttl: Duration,
    /// Upper bound on cached URLs; the oldest go first.
    pub cache_capacity: usize,
    pub timeout: Duration,
    pub user_agent: String,
    pub fingerprint_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("UFC_API_URL").unwrap_or_else(|| "http://localhost:8000".to_string());
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            dedupe_interval: lookup("UFC_CLIENT_DEDUPE_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_secs(2)),
            cache_ttl: lookup("UFC_CLIENT_CACHE_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(600)),
            cache_capacity: lookup("UFC_CLIENT_CACHE_ENTRIES")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(256),
            timeout: lookup("UFC_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(20)),
            user_agent: lookup("UFC_USER_AGENT").unwrap_or_else(|| "ufc-client/0.1".to_string()),
            fingerprint_file: lookup("UFC_FINGERPRINT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".ufc-fingerprint")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn config_defaults_and_overrides() {
        let defaults = ClientConfig::default();
        assert_eq!(defaults.api_url, "http://localhost:8000");
        assert_eq!(defaults.dedupe_interval, Duration::from_secs(2));
        assert_eq!(defaults.fingerprint_file, PathBuf::from(".ufc-fingerprint"));
        assert_eq!(defaults.cache_ttl, Duration::from_secs(600));
        assert_eq!(defaults.cache_capacity, 256);

        let env: HashMap<&str, &str> = HashMap::from([
            ("UFC_API_URL", "https://ufc.example.com/"),
            ("UFC_CLIENT_DEDUPE_MS", "250"),
            ("UFC_FINGERPRINT_FILE", "/tmp/fp"),
            ("UFC_CLIENT_CACHE_ENTRIES", "0"),
        ]);
        let cfg = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api_url, "https://ufc.example.com");
        assert_eq!(cfg.dedupe_interval, Duration::from_millis(250));
        assert_eq!(cfg.fingerprint_file, PathBuf::from("/tmp/fp"));
        assert_eq!(cfg.cache_capacity, 256);
    }
}
