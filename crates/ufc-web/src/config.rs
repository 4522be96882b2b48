use ufc_core::images::ImageHostPolicy;
use ufc_core::REPORT_THRESHOLD;

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub session_hours: i64,
    pub image_hosts: ImageHostPolicy,
    /// Reports after which a comment is hidden.
    pub report_threshold: i32,
    /// Adds `Secure` to the session cookie; off for plain-http local runs.
    pub secure_cookie: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
}

impl WebConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Fails when `JWT_SECRET` is unset or blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        Ok(Self {
            port: lookup("UFC_WEB_PORT").and_then(|v| v.parse().ok()).unwrap_or(8000),
            jwt_secret,
            session_hours: lookup("UFC_SESSION_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            image_hosts: lookup("UFC_IMAGE_HOSTS")
                .map(|v| ImageHostPolicy::parse_list(&v))
                .unwrap_or_default(),
            report_threshold: lookup("UFC_REPORT_THRESHOLD")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(REPORT_THRESHOLD),
            secure_cookie: lookup("UFC_SECURE_COOKIE").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WebConfig::from_lookup(|k| (k == "JWT_SECRET").then(|| "s3cret".to_string())).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.session_hours, 24);
        assert_eq!(config.report_threshold, REPORT_THRESHOLD);
        assert!(!config.secure_cookie);
    }

    #[test]
    fn jwt_secret_is_required() {
        let err = WebConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
        assert_eq!(err.to_string(), "missing required environment variable: JWT_SECRET");

        let blank = WebConfig::from_lookup(|k| (k == "JWT_SECRET").then(|| "  ".to_string()));
        assert!(blank.is_err());
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = WebConfig::from_lookup(|k| match k {
            "UFC_WEB_PORT" => Some("http".into()),
            "UFC_REPORT_THRESHOLD" => Some("0".into()),
            "JWT_SECRET" => Some("s3cret".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.report_threshold, REPORT_THRESHOLD);
        assert_eq!(config.jwt_secret, "s3cret");
    }
}
