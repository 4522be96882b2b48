//! Admin sessions: argon2 password hashes, HS256 JWTs carried either as a
//! Bearer token or in the `ufc_session` cookie.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use ufc_core::Usuario;
use ufc_storage::db::usuarios;
use uuid::Uuid;

use crate::error::{ApiError, ApiJson};
use crate::AppState;

pub const SESSION_COOKIE: &str = "ufc_session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|err| anyhow::anyhow!("hashing password: {err}"))
}

/// False for a wrong password and for a malformed stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

pub fn issue_token(usuario_id: Uuid, secret: &str, hours: i64) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: usuario_id.to_string(),
        exp: (now + Duration::hours(hours)).timestamp(),
        iat: now.timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|err| anyhow::anyhow!("signing session token: {err}"))
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized)
}

/// Bearer header first, then the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// A logged-in admin. Rejects with 401 before touching the database when no
/// valid token is present.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Usuario);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let claims = validate_token(&token, &state.config.jwt_secret)?;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;
        let usuario = usuarios::find_by_id(&state.pool, id)
            .await?
            .ok_or(ApiError::Unauthorized)?;
        Ok(AdminUser(usuario))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("email e senha são obrigatórios"));
    }
    let usuario = usuarios::find_by_email(&state.pool, req.email.trim())
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if !verify_password(&req.password, &usuario.password_hash) {
        tracing::warn!(email = %usuario.email, "failed login");
        return Err(ApiError::Unauthorized);
    }
    let hours = state.config.session_hours;
    let token = issue_token(usuario.id, &state.config.jwt_secret, hours)?;
    let cookie = session_cookie(&token, hours * 3600, state.config.secure_cookie);
    tracing::info!(email = %usuario.email, "admin logged in");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "token": token, "usuario": usuario })),
    )
        .into_response())
}

pub async fn me(AdminUser(usuario): AdminUser) -> Json<Usuario> {
    Json(usuario)
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    (
        [(header::SET_COOKIE, session_cookie("", 0, state.config.secure_cookie))],
        Json(json!({ "ok": true })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_round_trip() {
        let id = Uuid::new_v4();
        let token = issue_token(id, "secret", 1).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert!(validate_token(&token, "other").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue_token(Uuid::new_v4(), "secret", -2).unwrap();
        assert!(matches!(validate_token(&token, "secret"), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("octogono").unwrap();
        assert!(verify_password("octogono", &hash));
        assert!(!verify_password("octagon", &hash));
        assert!(!verify_password("octogono", "not-a-hash"));
    }

    #[test]
    fn token_comes_from_bearer_or_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("tema=escuro; ufc_session=abc.def"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = session_cookie("", 0, true);
        assert!(cookie.starts_with("ufc_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.ends_with("; Secure"));
    }
}
