//! Server setup and initialization

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use social_common::{AppConfig, AppError, JwtService};
use social_core::SnowflakeGenerator;
use social_db::{create_pool, run_migrations, PgFollowRepository, PgPostRepository, PgUserRepository};
use social_service::ServiceContext;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware_with_config;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application.
///
/// Health probes are merged after the middleware so they bypass rate
/// limiting.
pub fn create_app(state: AppState) -> Result<Router, AppError> {
    let config = state.config();
    let api = apply_middleware_with_config(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    )?;

    Ok(api.merge(health_routes()).with_state(state))
}

/// Connect to PostgreSQL, bootstrap the schema and wire the service layer
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&social_db::DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let service_context = ServiceContext::builder()
        .user_repo(Arc::new(PgUserRepository::new(pool.clone())))
        .follow_repo(Arc::new(PgFollowRepository::new(pool.clone())))
        .post_repo(Arc::new(PgPostRepository::new(pool.clone())))
        .jwt_service(Arc::new(JwtService::from_config(&config.jwt)))
        .snowflake_generator(Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id)))
        .post_max_length(config.posts.max_length)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config).with_pool(pool))
}

/// Serve the application on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    serve(listener, app).await
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid API address: {e}")))?;

    let state = create_app_state(config).await?;
    let app = create_app(state)?;

    run_server(app, addr).await
}
