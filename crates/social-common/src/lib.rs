//! # social-common
//!
//! Shared utilities: environment configuration, the application error type,
//! JWT and password handling, and tracing setup.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

pub use auth::{
    hash_password, validate_password_strength, verify_password, Claims, JwtService,
    PasswordService, TokenPair, TokenType,
};
pub use config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, Environment, GatewayConfig,
    JwtConfig, PostConfig, RateLimitConfig, ServerConfig, SnowflakeConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
