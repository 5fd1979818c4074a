// src/bin/api_server.rs

use std::sync::Arc;
use stitchdesk::app::entity_store::EntityStore;
use stitchdesk::app::order_service::OrderService;
use stitchdesk::domain::SchemaRegistry;
use stitchdesk::infra::config::{ServerConfig, StoreConfig};
use stitchdesk::storage::table::SheetsClient;
use stitchdesk::transport;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stitchdesk=debug".parse().unwrap()),
        )
        .init();

    let store_config = StoreConfig::from_env()?;
    let server_config = ServerConfig::from_env();

    let registry = Arc::new(SchemaRegistry::with_catalog()?);
    info!(entities = registry.list_entities().len(), "schema catalog loaded");

    // Fails here, not on the first request, if credentials or the
    // document are broken.
    let store = Arc::new(SheetsClient::connect(&store_config).await?);

    let entities = EntityStore::new(store, registry);
    let orders = OrderService::new(entities.clone());
    let app_state = transport::http::AppState { entities, orders };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);
    let app = transport::http::create_router(app_state)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()),
        )
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr).await?;
    info!(addr = %server_config.bind_addr, "API server listening");
    info!("Swagger UI at /swagger-ui");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
