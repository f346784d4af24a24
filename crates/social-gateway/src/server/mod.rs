//! Gateway server setup

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::presence::PresenceTracker;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use social_common::{AppConfig, AppError, JwtService};
use social_core::SnowflakeGenerator;
use social_db::{PgFollowRepository, PgPostRepository, PgUserRepository};
use social_service::ServiceContext;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct GatewayHealth {
    pub status: &'static str,
    pub connections: usize,
    pub online_users: usize,
}

pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

async fn health_check(State(state): State<GatewayState>) -> Json<GatewayHealth> {
    Json(GatewayHealth {
        status: "ok",
        connections: state.presence().connection_count(),
        online_users: state.presence().online_count(),
    })
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect to the database and wire the service layer
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    tracing::info!("Connecting to PostgreSQL...");
    let pool = social_db::create_pool(&social_db::DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    tracing::info!("PostgreSQL connection established");

    let service_context = ServiceContext::builder()
        .user_repo(Arc::new(PgUserRepository::new(pool.clone())))
        .follow_repo(Arc::new(PgFollowRepository::new(pool.clone())))
        .post_repo(Arc::new(PgPostRepository::new(pool)))
        .jwt_service(Arc::new(JwtService::from_config(&config.jwt)))
        .snowflake_generator(Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id)))
        .post_max_length(config.posts.max_length)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(GatewayState::new(
        service_context,
        PresenceTracker::new_shared(),
        config,
    ))
}

/// Serve the gateway on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    serve(listener, app).await
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .server
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(config).await?;
    run_server(create_app(state), addr).await
}
