use surgery_api::{app, config, database, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL and friends
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Surgery API in {:?} mode", config.environment);

    if matches!(config.environment, config::Environment::Production)
        && config.security.jwt_secret.is_empty()
    {
        eprintln!("SECURITY_JWT_SECRET must be set in production");
        std::process::exit(1);
    }

    let pool = database::connect()
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));

    database::ensure_schema(&pool)
        .await
        .unwrap_or_else(|e| panic!("failed to prepare database schema: {}", e));

    let app = app(AppState { pool });

    // Allow tests or deployments to override port via env
    let port = std::env::var("SURGERY_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Surgery API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
