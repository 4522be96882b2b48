//! Postgres content store: one module per table, plain parameterized SQL.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
pub use sqlx::PgPool;

pub mod analises;
pub mod comentarios;
pub mod eventos;
pub mod lutadores;
pub mod lutas;
pub mod noticias;
pub mod previsoes;
pub mod ranking;
pub mod usuarios;

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Pool that opens connections on first use; lets the web app boot without
/// the database being reachable yet.
pub fn connect_lazy(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)
}

pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// LIMIT/OFFSET pair clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> Self {
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_clamped() {
        assert_eq!(Page::new(None, None, 20), Page { limit: 20, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(-5), 20), Page { limit: 1, offset: 0 });
        assert_eq!(Page::new(Some(10_000), Some(40), 20), Page { limit: 100, offset: 40 });
    }
}
