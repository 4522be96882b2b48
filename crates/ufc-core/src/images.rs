//! Allow-list of remote image hosts; anything else is stored as no image.

use url::Url;

/// Hosts the site is allowed to hotlink. `*.example.com` also matches
/// `example.com` itself.
pub const DEFAULT_IMAGE_HOSTS: &[&str] = &[
    "*.ufc.com",
    "dmxg5wxfqgb4u.cloudfront.net",
    "cdn.vox-cdn.com",
    "*.mmafighting.com",
    "*.sherdog.com",
    "*.glbimg.com",
    "*.espncdn.com",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHostPolicy {
    patterns: Vec<String>,
}

impl Default for ImageHostPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_HOSTS.iter().copied())
    }
}

impl ImageHostPolicy {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Comma-separated list, e.g. from an environment variable. Blank input
    /// falls back to the defaults.
    pub fn parse_list(raw: &str) -> Self {
        let policy = Self::new(raw.split(','));
        if policy.patterns.is_empty() {
            Self::default()
        } else {
            policy
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn allows(&self, url: &str) -> bool {
        let Some(host) = url_host(url) else {
            return false;
        };
        self.patterns.iter().any(|pattern| match pattern.strip_prefix("*.") {
            Some(suffix) => host == suffix || host.ends_with(&format!(".{suffix}")),
            None => host == *pattern,
        })
    }

    pub fn filter(&self, url: Option<String>) -> Option<String> {
        url.filter(|u| self.allows(u))
    }
}

/// Parsed absolute http(s) URL, or `None` for anything else.
pub fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Lowercased host of an absolute http(s) URL.
pub fn url_host(url: &str) -> Option<String> {
    let url = parse_http_url(url)?;
    url.host_str().filter(|h| !h.is_empty()).map(str::to_string)
}
