//! Anonymous identity used to attribute predictions without a login.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything hashed into a new fingerprint. The random component and the
/// timestamp keep two identical machines apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintInputs {
    pub user_agent: String,
    pub screen: String,
    pub timezone: String,
    pub locale: String,
    pub random: String,
    pub timestamp: DateTime<Utc>,
}

impl FingerprintInputs {
    /// Terminal-side stand-ins for the browser signals.
    pub fn from_environment(user_agent: &str) -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let screen = match (var("COLUMNS"), var("LINES")) {
            (Some(cols), Some(lines)) => format!("{cols}x{lines}"),
            _ => "unknown".to_string(),
        };
        Self {
            user_agent: user_agent.to_string(),
            screen,
            timezone: var("TZ").unwrap_or_else(|| chrono::Local::now().offset().to_string()),
            locale: var("LC_ALL").or_else(|| var("LANG")).unwrap_or_else(|| "und".to_string()),
            random: Uuid::new_v4().simple().to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(inputs: &FingerprintInputs) -> Self {
        let mut hasher = Sha256::new();
        for part in [
            inputs.user_agent.as_str(),
            inputs.screen.as_str(),
            inputs.timezone.as_str(),
            inputs.locale.as_str(),
            inputs.random.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(b"|");
        }
        hasher.update(inputs.timestamp.timestamp_millis().to_string().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Accepts only a 64-char lowercase hex digest.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = raw.len() == 64 && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reuses the fingerprint stored at `path`, or computes and stores a new
    /// one when the file is missing or unreadable.
    pub async fn load_or_create(path: &Path, inputs: impl FnOnce() -> FingerprintInputs) -> Result<Self> {
        match fs::read_to_string(path).await {
            Ok(raw) => {
                if let Some(existing) = Self::parse(&raw) {
                    return Ok(existing);
                }
                warn!(path = %path.display(), "stored fingerprint is malformed, replacing it");
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
        }

        let fingerprint = Self::compute(&inputs());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(path, format!("{}\n", fingerprint.0))
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "stored new fingerprint");
        Ok(fingerprint)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn inputs(random: &str) -> FingerprintInputs {
        FingerprintInputs {
            user_agent: "ufc-client/0.1".into(),
            screen: "120x40".into(),
            timezone: "America/Sao_Paulo".into(),
            locale: "pt_BR.UTF-8".into(),
            random: random.into(),
            timestamp: Utc.with_ymd_and_hms(2025, 5, 10, 3, 0, 0).unwrap(),
        }
    }

    #[test]
    fn digest_is_hex_sha256_of_the_inputs() {
        let a = Fingerprint::compute(&inputs("r1"));
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(Fingerprint::parse(a.as_str()), Some(a.clone()));
        assert_eq!(a, Fingerprint::compute(&inputs("r1")));
        assert_ne!(a, Fingerprint::compute(&inputs("r2")));
    }

    #[test]
    fn parse_rejects_anything_but_a_digest() {
        assert!(Fingerprint::parse("abc").is_none());
        assert!(Fingerprint::parse(&"G".repeat(64)).is_none());
        assert!(Fingerprint::parse(&format!("{}\n", "a".repeat(64))).is_some());
    }

    #[tokio::test]
    async fn fingerprint_is_persisted_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/fingerprint");

        let first = Fingerprint::load_or_create(&path, || inputs("r1")).await.unwrap();
        let second = Fingerprint::load_or_create(&path, || inputs("r2")).await.unwrap();

        assert_eq!(first, second);
        let stored = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stored.trim(), first.as_str());
    }

    #[tokio::test]
    async fn malformed_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprint");
        std::fs::write(&path, "not-a-digest").unwrap();

        let fp = Fingerprint::load_or_create(&path, || inputs("r1")).await.unwrap();
        assert_eq!(fp, Fingerprint::compute(&inputs("r1")));
    }
}
