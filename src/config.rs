// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`AppConfig`] loaded once at
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for documents and the profile cache | `./data` |
//! | `STORAGE_BACKEND` | `file` or `memory` | `file` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `FEDERATED_JWKS_URL` | JWKS endpoint for federated ID tokens (HTTPS) | Unset: federated sign-in off |
//! | `AUTH_MODE` | `production`, or `development` to accept unsigned ID tokens when no JWKS URL is set | `production` |
//! | `FEDERATED_ISSUER` | Expected ID token issuer claim | Optional |
//! | `FEDERATED_AUDIENCE` | Expected ID token audience claim | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use url::Url;

/// Environment variable name for the data directory path.
///
/// Collections live under `<DATA_DIR>/trips` and `<DATA_DIR>/users`, the
/// per-session profile cache under `<DATA_DIR>/sessions`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "./data";

pub const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
pub const HOST_ENV: &str = "HOST";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 8080;

pub const FEDERATED_JWKS_URL_ENV: &str = "FEDERATED_JWKS_URL";
pub const FEDERATED_ISSUER_ENV: &str = "FEDERATED_ISSUER";
pub const FEDERATED_AUDIENCE_ENV: &str = "FEDERATED_AUDIENCE";
pub const AUTH_MODE_ENV: &str = "AUTH_MODE";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{STORAGE_BACKEND_ENV} must be `file` or `memory`, got `{0}`")]
    InvalidBackend(String),

    #[error("{HOST_ENV} is not an IP address: `{0}`")]
    InvalidHost(String),

    #[error("{PORT_ENV} is not a valid port: `{0}`")]
    InvalidPort(String),

    #[error("{FEDERATED_JWKS_URL_ENV} is not a valid URL: {0}")]
    InvalidJwksUrl(String),

    #[error("{FEDERATED_JWKS_URL_ENV} must use https: `{0}`")]
    InsecureJwksUrl(String),

    #[error("{LOG_FORMAT_ENV} must be `json` or `pretty`, got `{0}`")]
    InvalidLogFormat(String),

    #[error("{AUTH_MODE_ENV} must be `production` or `development`, got `{0}`")]
    InvalidAuthMode(String),
}

/// Where documents are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

/// How federated ID tokens are checked when no JWKS URL is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Federated sign-in is refused.
    #[default]
    Production,
    /// Unsigned ID tokens are accepted. Never use outside local testing.
    Development,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub storage_backend: StorageBackend,
    pub host: IpAddr,
    pub port: u16,
    pub federated_jwks_url: Option<Url>,
    pub federated_issuer: Option<String>,
    pub federated_audience: Option<String>,
    pub auth_mode: AuthMode,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let storage_backend = match get(STORAGE_BACKEND_ENV).as_deref() {
            None | Some("file") => StorageBackend::File,
            Some("memory") => StorageBackend::Memory,
            Some(other) => return Err(ConfigError::InvalidBackend(other.to_string())),
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = host.parse().map_err(|_| ConfigError::InvalidHost(host))?;

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let federated_jwks_url = get(FEDERATED_JWKS_URL_ENV)
            .map(|raw| {
                let url =
                    Url::parse(&raw).map_err(|e| ConfigError::InvalidJwksUrl(e.to_string()))?;
                if url.scheme() != "https" {
                    return Err(ConfigError::InsecureJwksUrl(raw));
                }
                Ok(url)
            })
            .transpose()?;

        let auth_mode = match get(AUTH_MODE_ENV).as_deref() {
            None | Some("production") => AuthMode::Production,
            Some("development") => AuthMode::Development,
            Some(other) => return Err(ConfigError::InvalidAuthMode(other.to_string())),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        Ok(Self {
            data_dir: get(DATA_DIR_ENV)
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            storage_backend,
            host,
            port,
            federated_jwks_url,
            federated_issuer: get(FEDERATED_ISSUER_ENV),
            federated_audience: get(FEDERATED_AUDIENCE_ENV),
            auth_mode,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Log format straight from the environment, for use before the full
/// config has been loaded.
pub fn log_format_from_env() -> LogFormat {
    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}
