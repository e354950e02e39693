pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state. The pool is constructed once in main and
/// passed in explicitly; there is no ambient global connection handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

pub fn app(state: AppState) -> Router {
    use handlers::{professionals, surgeries, token};

    // Every domain route sits behind the bearer gate; /token is the only
    // credential-accepting route outside it.
    let protected = Router::new()
        .route("/surgeries/", get(surgeries::list).post(surgeries::create))
        .route(
            "/surgeries/:code",
            get(surgeries::get).put(surgeries::update).delete(surgeries::delete),
        )
        .route(
            "/professionals/",
            get(professionals::list).post(professionals::create),
        )
        .route(
            "/professionals/:id",
            get(professionals::get)
                .put(professionals::update)
                .delete(professionals::delete),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::bearer_auth_middleware,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/token", post(token::issue_token))
        .merge(protected)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Credentials rule out wildcard origins, so the allow list is explicit
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Surgery API",
        "version": version,
        "description": "Authenticated scheduling API for surgical procedures and team assignments",
        "endpoints": {
            "token": "POST /token (public - token acquisition)",
            "surgeries": "/surgeries/[:code] (bearer)",
            "professionals": "/professionals/[:id] (bearer)",
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
