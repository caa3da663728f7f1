// src/bin/api_server.rs

use anyhow::Context;
use clap::Parser;
use notify_service::infra::config::ServiceConfig;
use notify_service::infra::logging::init_tracing;
use notify_service::infra::tenant::MODULE_NAME;
use notify_service::storage::{postgres, StoreRegistry, TenantStores};
use notify_service::transport;
use notify_service::{Messages, NotifyService, ResourceSpec};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Notification storage service.
#[derive(Parser, Debug)]
#[command(version, about)]
struct CliArgs {
    /// Address to listen on; overrides NOTIFY_BIND_ADDR.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Keep notifications in process memory instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = ServiceConfig::from_env()?;
    init_tracing();

    // --- Resource ---
    let mut resource = ResourceSpec::notifications();
    if let Some(path) = &config.query_schema {
        resource = resource.with_schema_file(path);
    }
    if !config.validate_query_fields {
        info!("Query field validation disabled");
        resource = resource.without_field_validation();
    }

    // --- Store registry ---
    let pool = if cli.in_memory {
        warn!("Using the in-memory store; data is lost on shutdown");
        None
    } else {
        let url = config
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set (or pass --in-memory)")?;
        let pool = postgres::connect(url, config.max_connections)
            .await
            .context("Failed to connect to the database")?;
        info!("Connected to PostgreSQL (max {} connections)", config.max_connections);
        Some(pool)
    };
    let stores: Arc<dyn StoreRegistry> = match &pool {
        Some(pool) => Arc::new(TenantStores::postgres(
            pool.clone(),
            MODULE_NAME,
            vec![resource.table.clone()],
        )),
        None => Arc::new(TenantStores::in_memory()),
    };

    let service = NotifyService::new(resource, stores, Messages::new(&config.default_lang));
    let app_state = transport::http::AppState {
        service: Arc::new(service),
        pool,
        default_lang: config.default_lang.clone(),
    };

    // --- API Server Initialization ---
    let bind = cli.bind.unwrap_or(config.bind_addr);
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("API server listening on http://{}", bind);
    info!("Swagger UI available at http://{}/swagger-ui", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received (Ctrl+C)...");
}
