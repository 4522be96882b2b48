use std::collections::HashSet;

use strsim::jaro_winkler;
use url::Url;
use ufc_core::text::normalize_title;

#[derive(Debug, Clone, Copy)]
pub struct DedupConfig {
    /// Jaro-Winkler score at or above which two normalized titles are the same story.
    pub title_threshold: f64,
    /// How far back stored titles are compared.
    pub window_days: i64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            title_threshold: 0.93,
            window_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateOf {
    StoredUrl,
    RepeatedUrl,
    SimilarTitle(String),
}

/// Tracks what a sync run has already seen: stored URLs, recent stored
/// titles, and everything accepted earlier in the run.
pub struct DedupEngine {
    config: DedupConfig,
    urls: HashSet<String>,
    stored_urls: HashSet<String>,
    titles: Vec<(String, String)>,
}

impl DedupEngine {
    pub fn new(config: DedupConfig, stored_urls: HashSet<String>, recent_titles: Vec<String>) -> Self {
        Self {
            config,
            urls: HashSet::new(),
            stored_urls,
            titles: recent_titles
                .into_iter()
                .map(|t| (normalize_title(&t), t))
                .collect(),
        }
    }

    pub fn config(&self) -> DedupConfig {
        self.config
    }

    pub fn similarity(a: &str, b: &str) -> f64 {
        jaro_winkler(&normalize_title(a), &normalize_title(b))
    }

    /// Checks one item; when it is new it is remembered so later items in
    /// the same run are compared against it.
    pub fn check(&mut self, fonte_url: &str, titulo: &str) -> Option<DuplicateOf> {
        if self.stored_urls.contains(fonte_url) {
            return Some(DuplicateOf::StoredUrl);
        }
        if self.urls.contains(fonte_url) {
            return Some(DuplicateOf::RepeatedUrl);
        }
        let normalized = normalize_title(titulo);
        if let Some((_, original)) = self
            .titles
            .iter()
            .find(|(seen, _)| jaro_winkler(seen, &normalized) >= self.config.title_threshold)
        {
            return Some(DuplicateOf::SimilarTitle(original.clone()));
        }
        self.urls.insert(fonte_url.to_string());
        self.titles.push((normalized, titulo.to_string()));
        None
    }
}

/// Canonical form used for `fonte_url`: lowercase scheme and host, no
/// fragment, no tracking parameters, no trailing slash. Input that does not
/// parse as an absolute URL is only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }
    url.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || matches!(key.as_str(), "fbclid" | "gclid" | "ref" | "cmpid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(stored: &[&str], recent: &[&str]) -> DedupEngine {
        DedupEngine::new(
            DedupConfig::default(),
            stored.iter().map(|s| s.to_string()).collect(),
            recent.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn stored_and_repeated_urls_are_duplicates() {
        let mut e = engine(&["https://a.com/1"], &[]);
        assert_eq!(e.check("https://a.com/1", "Qualquer"), Some(DuplicateOf::StoredUrl));
        assert_eq!(e.check("https://a.com/2", "Pereira defende o cinturão"), None);
        assert_eq!(e.check("https://a.com/2", "Outro título totalmente diferente"), Some(DuplicateOf::RepeatedUrl));
    }

    #[test]
    fn near_identical_titles_are_duplicates() {
        let mut e = engine(&[], &["Alex Pereira x Magomed Ankalaev: revanche confirmada para o UFC 320"]);
        let dup = e.check(
            "https://b.com/x",
            "Alex Pereira x Magomed Ankalaev - revanche confirmada para o UFC 320!",
        );
        assert!(matches!(dup, Some(DuplicateOf::SimilarTitle(_))));
        assert_eq!(e.check("https://b.com/y", "Jon Jones anuncia aposentadoria do MMA"), None);
        assert!(matches!(
            e.check("https://b.com/z", "Jon Jones anuncia aposentadoria do MMA."),
            Some(DuplicateOf::SimilarTitle(t)) if t == "Jon Jones anuncia aposentadoria do MMA"
        ));
    }

    #[test]
    fn different_stories_pass() {
        let a = "Makhachev confirma subida para o meio-médio";
        let b = "Pantoja defende cinturão contra Kara-France";
        assert!(DedupEngine::similarity(a, b) < DedupConfig::default().title_threshold);
    }

    #[test]
    fn urls_are_normalized() {
        assert_eq!(
            normalize_url("HTTPS://WWW.MMAFighting.com/2025/8/1/Story/?utm_source=rss&id=3#comments"),
            "https://www.mmafighting.com/2025/8/1/Story?id=3"
        );
        assert_eq!(normalize_url("https://ufc.com/"), "https://ufc.com/");
        assert_eq!(normalize_url("https://ufc.com/a?utm_medium=x"), "https://ufc.com/a");
        assert_eq!(normalize_url("https://ufc.com:443/a?UTM_Campaign=y&gclid=1"), "https://ufc.com/a");
        assert_eq!(normalize_url(" sem-esquema "), "sem-esquema");
    }
}
