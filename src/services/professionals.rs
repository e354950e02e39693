use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::database::models::Professional;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum ProfessionalError {
    #[error("Professional {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<ProfessionalError> for ApiError {
    fn from(err: ProfessionalError) -> Self {
        match err {
            ProfessionalError::NotFound(id) => {
                ApiError::not_found(format!("Professional {} not found", id))
            }
            ProfessionalError::Database(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfessionalData {
    pub name: String,
    pub council_id: Option<String>,
}

pub async fn list(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<Professional>, ProfessionalError> {
    let rows = sqlx::query_as::<_, Professional>(
        "SELECT id, name, council_id FROM professionals ORDER BY id OFFSET $1 LIMIT $2",
    )
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Professional, ProfessionalError> {
    sqlx::query_as::<_, Professional>(
        "SELECT id, name, council_id FROM professionals WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(ProfessionalError::NotFound(id))
}

pub async fn create(pool: &PgPool, data: &ProfessionalData) -> Result<Professional, ProfessionalError> {
    let row = sqlx::query_as::<_, Professional>(
        "INSERT INTO professionals (name, council_id) VALUES ($1, $2) RETURNING id, name, council_id",
    )
    .bind(&data.name)
    .bind(&data.council_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update(pool: &PgPool, id: i64, data: &ProfessionalData) -> Result<Professional, ProfessionalError> {
    sqlx::query_as::<_, Professional>(
        "UPDATE professionals SET name = $2, council_id = $3 WHERE id = $1 RETURNING id, name, council_id",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.council_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ProfessionalError::NotFound(id))
}

/// Delete a professional. Any team association rows referencing it cascade
/// away; the surgeries they belonged to are untouched.
pub async fn delete(pool: &PgPool, id: i64) -> Result<(), ProfessionalError> {
    let result = sqlx::query("DELETE FROM professionals WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ProfessionalError::NotFound(id));
    }
    Ok(())
}
