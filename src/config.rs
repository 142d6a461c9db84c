use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = ".retreat/retreat.db";
/// Longest login session: one year.
pub const MAX_SESSION_HOURS: i64 = 24 * 365;

/// Top-level configuration for the service, read from `.env` and the
/// environment. CLI flags override individual fields afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    /// Lifetime of a login session.
    pub session_hours: i64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `load` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = lookup("RETREAT_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        let host = lookup("RETREAT_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match lookup("RETREAT_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 3000,
        };
        let log_level = lookup("RETREAT_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let session_hours = match lookup("RETREAT_SESSION_HOURS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if (1..=MAX_SESSION_HOURS).contains(&hours) => hours,
                _ => return Err(ConfigError::InvalidSessionHours(raw)),
            },
            None => 12,
        };

        Ok(Self {
            db_path,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            session_hours,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost {
                host: self.host.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("RETREAT_PORT must be a valid u16, got '{0}'")]
    InvalidPort(String),
    #[error("RETREAT_HOST must parse to an IPv4 or IPv6 address, got '{host}'")]
    InvalidHost {
        host: String,
        source: std::net::AddrParseError,
    },
    #[error("RETREAT_SESSION_HOURS must be a whole number from 1 to {MAX_SESSION_HOURS}, got '{0}'")]
    InvalidSessionHours(String),
}
