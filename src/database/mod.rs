pub mod models;

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Build the connection pool from DATABASE_URL.
///
/// The pool is an explicit handle owned by main and threaded through axum
/// state; nothing in this crate reaches for a global connection.
pub async fn connect() -> Result<PgPool, DatabaseError> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

    let db_config = &config::config().database;
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout_secs))
        .connect(&url)
        .await?;

    info!("Created database pool ({} max connections)", db_config.max_connections);
    Ok(pool)
}

/// Create the schema if it does not exist yet.
///
/// Association rows are owned by the surgery side and only weakly reference
/// professionals, so both foreign keys cascade: deleting a surgery or a
/// professional takes its team rows with it, never the other parent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            BIGSERIAL PRIMARY KEY,
            username      TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS surgeries (
            surgery_code          BIGINT PRIMARY KEY,
            establishment_code    BIGINT NOT NULL,
            room                  TEXT NOT NULL,
            date                  DATE NOT NULL,
            start_time            TIME NOT NULL,
            status_code           TEXT NOT NULL,
            status_description    TEXT NOT NULL,
            patient_code          BIGINT NOT NULL,
            patient_name          TEXT NOT NULL,
            attendance_type       TEXT NOT NULL,
            physician_code        BIGINT NOT NULL,
            physician_name        TEXT NOT NULL,
            physician_council_id  TEXT NOT NULL,
            procedure_description TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS professionals (
            id         BIGSERIAL PRIMARY KEY,
            name       TEXT NOT NULL,
            council_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS surgery_team (
            surgery_code    BIGINT NOT NULL REFERENCES surgeries(surgery_code) ON DELETE CASCADE,
            professional_id BIGINT NOT NULL REFERENCES professionals(id) ON DELETE CASCADE,
            role            TEXT NOT NULL,
            PRIMARY KEY (surgery_code, professional_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_surgeries_date ON surgeries (date)")
        .execute(pool)
        .await?;

    info!("Database schema is up to date");
    Ok(())
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
