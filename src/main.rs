use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use lolcourt_backend::api::{self, AppState};
use lolcourt_backend::config::{self, Config};
use lolcourt_backend::court::rewards::HeuristicRewardTable;
use lolcourt_backend::db::Database;
use lolcourt_backend::metrics;
use lolcourt_backend::rate_limit::RateLimiter;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();
    config::set_local_mode(config.local_mode);
    if config.local_mode {
        tracing::info!("Local mode enabled: rate limiting disabled");
    }
    metrics::register_metrics();

    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");

    let table = match HeuristicRewardTable::load_or_seed(&config.learning_snapshot_path) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Ignoring unreadable learning snapshot: {e}");
            HeuristicRewardTable::new()
        }
    };
    let rewards = Arc::new(RwLock::new(table));

    let state = AppState {
        db: Arc::new(db),
        rewards: rewards.clone(),
        rate_limiter: RateLimiter::new(),
        snapshot_path: config.learning_snapshot_path.clone(),
        trust_forwarded_for: config.trust_forwarded_for,
    };
    if config.trust_forwarded_for {
        tracing::info!("Rate limiting on x-forwarded-for (trusted proxy)");
    }

    let mut app = api::router(state, config.max_upload_bytes);
    if let Some(dir) = &config.static_dir {
        tracing::info!("Serving frontend from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }
    let app = app.layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("LoL Court backend listening on {addr}");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    let table = rewards.read().unwrap_or_else(|e| e.into_inner());
    match table.save(&config.learning_snapshot_path) {
        Ok(()) => tracing::info!(
            "Saved learning snapshot to {}",
            config.learning_snapshot_path.display()
        ),
        Err(e) => tracing::error!("Failed to save learning snapshot: {e}"),
    }
}
