//! Bankbook Server
//!
//! REST API server for banking-client records. One store backend is selected
//! at startup (MongoDB, MySQL, or in-memory) and the same aggregate endpoints
//! run against it.
//!
//! ## Configuration
//!
//! Loaded from a TOML file (`config.toml`, `bankbook.toml`, or the path in
//! `BANKBOOK_CONFIG`) with environment overrides:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BANKBOOK_HTTP_PORT` | `8080` | HTTP API port |
//! | `BANKBOOK_STORE_BACKEND` | `memory` | `mongo`, `mysql` or `memory` |
//! | `BANKBOOK_MONGODB_URI` | `mongodb://localhost:27017` | MongoDB connection URI |
//! | `BANKBOOK_MONGODB_DATABASE` | `bankbook` | MongoDB database name |
//! | `BANKBOOK_MYSQL_URL` | `mysql://localhost:3306/bankbook` | MySQL connection URL |
//! | `BANKBOOK_DEV_MODE` | `false` | Seed sample data on startup |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use sqlx::mysql::MySqlPoolOptions;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use bb_config::{AppConfig, StoreBackend};
use bb_core::client::api::{clients_router, ClientsState};
use bb_core::seed::DevDataSeeder;
use bb_core::{
    ClientAggregateService, ClientStore, MemoryClientStore, MongoClientStore, MySqlClientStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    bb_common::logging::init_logging("bb-server");

    info!("Starting Bankbook Server");

    let config = AppConfig::load()?;

    let store = build_store(&config).await?;
    store.init_schema().await?;

    let service = Arc::new(ClientAggregateService::new(store));

    if config.dev_mode {
        info!("Dev mode enabled");
        DevDataSeeder::new(service.clone()).seed().await?;
    }

    let clients_state = ClientsState { service };

    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/clients", clients_router(clients_state))
        .split_for_parts();

    openapi.info.title = "Bankbook API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description =
        Some("REST API for banking-client records and balance history".to_string());

    let app = Router::new()
        .merge(router)
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = format!("{}:{}", config.http.host, config.http.port);
    info!("API server listening on http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Bankbook Server shutdown complete");
    Ok(())
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn ClientStore>> {
    let store: Arc<dyn ClientStore> = match config.store.backend {
        StoreBackend::Mongo => {
            info!(
                "Connecting to MongoDB: {}/{}",
                config.mongodb.uri, config.mongodb.database
            );
            let client = mongodb::Client::with_uri_str(&config.mongodb.uri).await?;
            let db = client.database(&config.mongodb.database);
            Arc::new(MongoClientStore::new(&db))
        }
        StoreBackend::Mysql => {
            info!("Connecting to MySQL: {}", config.mysql.url);
            let pool = MySqlPoolOptions::new()
                .max_connections(config.mysql.max_connections)
                .connect(&config.mysql.url)
                .await?;
            Arc::new(MySqlClientStore::new(pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Arc::new(MemoryClientStore::new())
        }
    };
    Ok(store)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "READY"
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received...");
}
