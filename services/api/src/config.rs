//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use studio_core::guard::GuardPaths;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which adapters back the ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// Postgres for tables, sessions and codes; the filesystem for blobs.
    Postgres,
    /// Tables, sessions and codes in process memory; blobs still on the
    /// filesystem. Development only; lost on restart.
    Memory,
}

/// SMTP settings for sending one-time codes.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub log_level: Level,
    pub storage_root: PathBuf,
    pub public_storage_url: String,
    pub allowed_origin: String,
    pub session_ttl_days: i64,
    pub otp_ttl_minutes: i64,
    pub cookie_secure: bool,
    /// Sign-in requests each client may make per minute, after the burst.
    pub auth_rate_per_minute: f64,
    pub auth_burst: f64,
    pub smtp: Option<SmtpConfig>,
    pub guard_paths: GuardPaths,
}

impl Default for Config {
    /// Settings for a throwaway in-memory server on localhost.
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            store_backend: StoreBackend::Memory,
            database_url: None,
            log_level: Level::INFO,
            storage_root: PathBuf::from("./storage"),
            public_storage_url: "/storage".to_string(),
            allowed_origin: "http://localhost:3000".to_string(),
            session_ttl_days: 30,
            otp_ttl_minutes: 10,
            cookie_secure: false,
            auth_rate_per_minute: 6.0,
            auth_burst: 10.0,
            smtp: None,
            guard_paths: GuardPaths::default(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Store Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let store_backend = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORE_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL".to_string()));
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Object Storage Settings ---
        let storage_root = std::env::var("STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./storage"));
        let public_storage_url = std::env::var("PUBLIC_STORAGE_URL")
            .unwrap_or_else(|_| "/storage".to_string())
            .trim_end_matches('/')
            .to_string();

        // --- Load Auth Settings ---
        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let session_ttl_days = parse_var("SESSION_TTL_DAYS", 30)?;
        let otp_ttl_minutes = parse_var("OTP_TTL_MINUTES", 10)?;
        let cookie_secure = parse_var("COOKIE_SECURE", true)?;
        let auth_rate_per_minute = parse_var("AUTH_RATE_PER_MINUTE", 6.0)?;
        let auth_burst = parse_var("AUTH_BURST", 10.0)?;

        // --- Load Mail Settings (optional) ---
        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", 587)?,
                from_address: std::env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "noreply@studio.local".to_string()),
                user: std::env::var("SMTP_USER").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
            }),
            Err(_) => None,
        };

        Ok(Self {
            bind_address,
            store_backend,
            database_url,
            log_level,
            storage_root,
            public_storage_url,
            allowed_origin,
            session_ttl_days,
            otp_ttl_minutes,
            cookie_secure,
            auth_rate_per_minute,
            auth_burst,
            smtp,
            guard_paths: GuardPaths::default(),
        })
    }
}
