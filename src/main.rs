use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use dealership_api as api;

use api::{clock::SystemClock, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(&cfg.log_level, cfg.log_json);

    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await?;
    }

    let state = AppState::new(Arc::new(db_pool), cfg.clone(), Arc::new(SystemClock));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api::handlers::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port configuration")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Dealership API",
        "description": "Car inventory, relocations, sales, CSV import and reports",
        "endpoints": {
            "cars": "/api/cars",
            "movements": "/api/movements",
            "sales": "/api/sales",
            "buyers": "/api/buyers",
            "reports": "/api/reports",
            "imports": "/api/imports",
        },
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let status = match api::db::check_connection(&state.db).await {
        Ok(()) => "ok",
        Err(_) => "degraded",
    };
    Json(json!({ "status": status }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
