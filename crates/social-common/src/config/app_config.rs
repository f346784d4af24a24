//! Application configuration
//!
//! Loaded from environment variables (optionally seeded from a `.env` file).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub snowflake: SnowflakeConfig,
    pub posts: PostConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment `{other}`")),
        }
    }
}

/// Listen address
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// WebSocket gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    /// Interval clients are told to heartbeat at
    pub heartbeat_interval_ms: u64,
    /// Outbound queue depth per connection
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Seconds
    pub access_token_expiry: i64,
    /// Seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    pub worker_id: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostConfig {
    pub max_length: usize,
}

const DEFAULT_APP_NAME: &str = "social-server";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_API_PORT: u16 = 3000;
const DEFAULT_GATEWAY_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_MIN_CONNECTIONS: u32 = 5;
const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 900;
const DEFAULT_REFRESH_TOKEN_EXPIRY: i64 = 604_800;
const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;
const DEFAULT_BURST: u32 = 50;
const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 41_250;
const DEFAULT_CHANNEL_CAPACITY: usize = 64;
const MIN_JWT_SECRET_LEN: usize = 32;
const MAX_WORKER_ID: u16 = 1023;

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unset optional keys fall back to defaults; keys that are set but fail to
    /// parse are reported instead of silently defaulted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let jwt_secret = vars.required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET",
                format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            ));
        }

        let worker_id = vars.parsed("SNOWFLAKE_WORKER_ID", 0u16)?;
        if worker_id > MAX_WORKER_ID {
            return Err(ConfigError::InvalidValue(
                "SNOWFLAKE_WORKER_ID",
                format!("must be <= {MAX_WORKER_ID}"),
            ));
        }

        Ok(Self {
            app: AppSettings {
                name: vars.or("APP_NAME", DEFAULT_APP_NAME),
                env: vars.parsed("APP_ENV", Environment::Development)?,
            },
            api: ServerConfig {
                host: vars.or("API_HOST", DEFAULT_HOST),
                port: vars.parsed("API_PORT", DEFAULT_API_PORT)?,
            },
            gateway: GatewayConfig {
                server: ServerConfig {
                    host: vars.or("GATEWAY_HOST", DEFAULT_HOST),
                    port: vars.parsed("GATEWAY_PORT", DEFAULT_GATEWAY_PORT)?,
                },
                heartbeat_interval_ms: vars
                    .parsed("GATEWAY_HEARTBEAT_INTERVAL_MS", DEFAULT_HEARTBEAT_INTERVAL_MS)?,
                channel_capacity: vars
                    .parsed("GATEWAY_CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY)?,
            },
            database: DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                max_connections: vars
                    .parsed("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
                min_connections: vars
                    .parsed("DATABASE_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_token_expiry: vars
                    .parsed("JWT_ACCESS_TOKEN_EXPIRY", DEFAULT_ACCESS_TOKEN_EXPIRY)?,
                refresh_token_expiry: vars
                    .parsed("JWT_REFRESH_TOKEN_EXPIRY", DEFAULT_REFRESH_TOKEN_EXPIRY)?,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: vars
                    .parsed("RATE_LIMIT_REQUESTS_PER_SECOND", DEFAULT_REQUESTS_PER_SECOND)?,
                burst: vars.parsed("RATE_LIMIT_BURST", DEFAULT_BURST)?,
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            snowflake: SnowflakeConfig { worker_id },
            posts: PostConfig {
                max_length: vars.parsed("POST_MAX_LENGTH", social_core::POST_MAX_LENGTH)?,
            },
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        (self.0)(key)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar(key))
    }

    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match (self.0)(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key, raw)),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
