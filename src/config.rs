use crate::constants::*;
use axum::http::HeaderValue;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: String,
    pub cors_origins: Vec<HeaderValue>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(String),
    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("SERVER_PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        let data_path = env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());
        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(origins) => parse_cors_origins(&origins)?,
            Err(_) => default_cors_origins(),
        };

        // Validate port is a valid number
        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidPort(port));
        }

        Ok(Config {
            host,
            port,
            data_path,
            cors_origins,
        })
    }

    /// Configuration for tests: local host, default origins, the given data directory.
    pub fn for_data_path(data_path: &str) -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT.to_string(),
            data_path: data_path.to_string(),
            cors_origins: default_cors_origins(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_cors_origins() -> Vec<HeaderValue> {
    DEFAULT_CORS_ORIGINS
        .iter()
        .map(|origin| HeaderValue::from_static(*origin))
        .collect()
}

/// Parses a comma separated list of origins, ignoring blank entries.
pub fn parse_cors_origins(origins: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| ConfigError::InvalidCorsOrigin(origin.to_string()))
        })
        .collect()
}
