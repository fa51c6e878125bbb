use axum_extra::extract::cookie::SameSite;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. When unset the URL is composed from the parts below.
    pub url: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub host: String,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub access_token_secret: String,
    pub token_ttl_secs: i64,
    pub cookie_name: String,
    /// Allowed CORS origins; a single "*" opens CORS to any origin.
    pub cors_origins: Vec<String>,
    pub enforce_auth: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        if config.security.access_token_secret.is_empty() {
            return Err(ConfigError::Missing("ACCESS_TOKEN_SECRET"));
        }

        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DB_USER") {
            self.database.user = Some(v);
        }
        if let Ok(v) = env::var("DB_PASS") {
            self.database.password = Some(v);
        }
        if let Ok(v) = env::var("DB_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse_var("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse_var("API_MAX_REQUEST_SIZE_BYTES", &v)?;
        }

        // Security overrides
        if let Ok(v) = env::var("ACCESS_TOKEN_SECRET") {
            self.security.access_token_secret = v;
        }
        if let Ok(v) = env::var("TOKEN_TTL_SECS") {
            self.security.token_ttl_secs = parse_ttl(&v)?;
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = parse_origins(&v);
        }
        if let Ok(v) = env::var("ENFORCE_AUTH") {
            self.security.enforce_auth = parse_flag("ENFORCE_AUTH", &v)?;
        }

        Ok(self)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                ..DatabaseConfig::default()
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                ..DatabaseConfig::default()
            },
            api: ApiConfig {
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                ..DatabaseConfig::default()
            },
            api: ApiConfig {
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

impl Environment {
    /// NODE_ENV is honoured so existing deployment manifests keep working.
    fn from_env() -> Self {
        let raw = env::var("APP_ENV").or_else(|_| env::var("NODE_ENV"));
        match raw.as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            password: None,
            host: "localhost:5432".to_string(),
            name: "jobquest".to_string(),
            max_connections: 10,
            connection_timeout: 30,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            token_ttl_secs: 60 * 60, // 1 hour
            cookie_name: "token".to_string(),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "https://jobquest-4ccdb.web.app".to_string(),
            ],
            enforce_auth: true,
        }
    }
}

impl SecurityConfig {
    pub fn cors_is_open(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl AppConfig {
    /// Cross-site cookies in production must be `Secure`; browsers drop
    /// `SameSite=None` otherwise.
    pub fn cookie_secure(&self) -> bool {
        self.is_production()
    }

    pub fn cookie_same_site(&self) -> SameSite {
        if self.is_production() {
            SameSite::None
        } else {
            SameSite::Strict
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

/// Accepts the usual spellings of a boolean switch, case-insensitively
fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}

/// Token lifetime in seconds: positive and at most a year
fn parse_ttl(value: &str) -> Result<i64, ConfigError> {
    let secs: i64 = parse_var("TOKEN_TTL_SECS", value)?;
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(ConfigError::Invalid {
            name: "TOKEN_TTL_SECS",
            value: value.to_string(),
        });
    }
    Ok(secs)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
