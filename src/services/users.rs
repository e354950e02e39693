use sqlx::PgPool;

use crate::database::models::User;

/// Look up a user by username. The authorization gate calls this on every
/// request so a deleted user stops resolving even while their token is
/// still within its expiry window.
pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Create a user, or rotate the stored hash if the username already exists.
/// Used by the provisioning binary; no HTTP endpoint exposes this.
pub async fn upsert(pool: &PgPool, username: &str, password_hash: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash
        RETURNING id, username, password_hash
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}
