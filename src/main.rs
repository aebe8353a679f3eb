use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use prometheus::TextEncoder;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use room_rates::{
    build_app,
    config::{load_config, DataSourceConfig},
    metrics::Metrics,
    RoomRatesService,
};

#[derive(Clone)]
struct AdminState {
    metrics: Arc<Metrics>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "room_rates=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Room Rates Service");

    let config_path = std::env::var("CONFIG_PATH").ok();
    if let Some(path) = &config_path {
        info!("Loading configuration from: {}", path);
    }
    let config = load_config(config_path.as_deref())?;

    let data_source = match config.data_source {
        DataSourceConfig::Random => "random",
        DataSourceConfig::Fixed { .. } => "fixed",
    };
    info!(
        capacity = config.rate_limit.capacity,
        refill_interval = ?config.rate_limit.refill_interval(),
        data_source,
        "Rate limiter configured"
    );

    let metrics = Arc::new(Metrics::new()?);
    let service = Arc::new(RoomRatesService::from_config(&config, metrics.clone())?);

    let api_server = start_api_server(service, config.listen_addr);
    let admin_server = start_admin_server(AdminState { metrics }, config.admin_addr);

    info!("API server listening on {}", config.listen_addr);
    info!("Admin server listening on {}", config.admin_addr);

    // Wait for shutdown signal
    tokio::select! {
        result = api_server => {
            if let Err(e) = result {
                warn!("API server error: {}", e);
            }
        }
        result = admin_server => {
            if let Err(e) = result {
                warn!("Admin server error: {}", e);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    info!("Service stopped");
    Ok(())
}

async fn start_api_server(service: Arc<RoomRatesService>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, build_app(service)).await?;

    Ok(())
}

async fn start_admin_server(state: AdminState, addr: SocketAddr) -> Result<()> {
    let app: Router = Router::new()
        .route("/healthcheck", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn metrics_handler(State(state): State<AdminState>) -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics) => Ok(metrics),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
