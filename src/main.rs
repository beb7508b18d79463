use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod metrics;
mod storage;

use api::AppState;
use config::AppConfig;
use domain::order::placement::OrderPlacementService;
use domain::ports::{CatalogReader, CustomerReader, OrderReader, OrderWriter};
use storage::PgStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ordertrack=debug")),
        )
        .init();

    tracing::info!("🚀 Starting ordertrack order-management backend");

    let config = AppConfig::from_env()?;

    // === 1. Connect to Postgres and bring the schema up to date ===
    tracing::info!("Connecting to Postgres...");
    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    store.run_migrations().await?;
    tracing::info!("✅ Schema up to date");

    // === 2. Initialize Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    // Start metrics HTTP server in background thread
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("metrics runtime");
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 3. Wire the placement workflow ===
    // The delivery-charge policy is injected once here and read-only
    // for the lifetime of the process.
    let placement = OrderPlacementService::new(
        store.clone() as Arc<dyn CustomerReader>,
        store.clone() as Arc<dyn CatalogReader>,
        store.clone() as Arc<dyn OrderWriter>,
        config.delivery_charge.clone(),
    );

    let state = web::Data::new(AppState {
        placement,
        orders: store.clone() as Arc<dyn OrderReader>,
        metrics: metrics.clone(),
    });

    // === 4. Serve the HTTP API ===
    tracing::info!(port = config.http_port, "🌐 Serving HTTP API");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .bind(("0.0.0.0", config.http_port))?
        .run()
        .await?;

    Ok(())
}
