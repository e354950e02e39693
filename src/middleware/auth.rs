use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::token;
use crate::error::ApiError;
use crate::services::users;
use crate::AppState;

/// Authenticated principal resolved from a valid bearer token. Injected as a
/// request extension; handlers behind the gate can rely on it being present.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// Authorization gate for every surgery/professional route.
///
/// The token subject is re-resolved against the users table on each request
/// rather than trusted from the payload, so a deleted user is locked out
/// even while holding an unexpired token. Validation failures all surface
/// as the same 401 to avoid telling a probing client which check failed.
pub async fn bearer_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;

    let subject = token::validate(&token)
        .map_err(|_| ApiError::unauthorized("Could not validate credentials"))?;

    let user = users::find_by_username(&state.pool, &subject)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
    });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Not authenticated"))?;

    // Auth schemes compare case-insensitively (RFC 7235)
    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ApiError::unauthorized("Not authenticated"));
    }
    Ok(token.to_string())
}
