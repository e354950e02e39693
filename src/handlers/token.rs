use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{password, token};
use crate::error::ApiError;
use crate::services::users;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

// Unknown username and wrong password must be indistinguishable, so the
// same message serves both paths.
const BAD_CREDENTIALS: &str = "Incorrect username or password";

/// POST /token - exchange form credentials for a bearer token
pub async fn issue_token(
    State(state): State<AppState>,
    Form(form): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = match users::find_by_username(&state.pool, &form.username).await? {
        Some(user) => user,
        None => {
            warn!(username = %form.username, "login attempt for unknown user");
            return Err(ApiError::unauthorized(BAD_CREDENTIALS));
        }
    };

    // bcrypt is deliberately slow; keep it off the async worker threads
    let plaintext = form.password;
    let stored = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || password::verify_password(&plaintext, &stored))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("hash verification task failed: {}", e)))?;

    if !matches {
        warn!(username = %user.username, "login attempt with wrong password");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let access_token = token::issue(&user.username)
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}
