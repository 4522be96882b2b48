use sqlx::PgPool;
use ufc_core::Usuario;
use uuid::Uuid;

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Usuario>, sqlx::Error> {
    sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Usuario>, sqlx::Error> {
    sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Creates the account or resets its name and password hash.
pub async fn upsert(pool: &PgPool, email: &str, nome: &str, password_hash: &str) -> Result<Usuario, sqlx::Error> {
    sqlx::query_as::<_, Usuario>(
        r#"
        INSERT INTO usuarios (id, email, nome, password_hash)
        VALUES ($1, lower($2), $3, $4)
        ON CONFLICT (email) DO UPDATE
           SET nome = EXCLUDED.nome,
               password_hash = EXCLUDED.password_hash
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(nome)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}
