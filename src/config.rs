// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the user database | `./data` |
//! | `COGNITO_REGION` | AWS region of the user pool (alias `REGION`) | Required |
//! | `COGNITO_USER_POOL_ID` | User pool ID (alias `USER_POOL_ID`) | Required |
//! | `COGNITO_CLIENT_ID` | App client ID (alias `CLIENT_ID`) | Required |
//! | `COGNITO_CLIENT_SECRET` | App client secret (alias `CLIENT_SECRET`) | Required |
//! | `COGNITO_ENDPOINT` | Cognito API endpoint override | Regional endpoint |
//! | `JWKS_CACHE_TTL_SECS` | Signing key cache lifetime | `3600` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; HTTPS is served when both are set | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use url::Url;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// File name of the embedded user database inside `DATA_DIR`.
pub const USER_DB_FILE: &str = "users.redb";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Cognito user pool settings.
#[derive(Debug, Clone)]
pub struct CognitoConfig {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// API endpoint receiving `GetUser` / `InitiateAuth` calls.
    pub endpoint: Url,
}

impl CognitoConfig {
    /// Expected `iss` claim of access tokens issued by the pool.
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// Well-known JWKS document of the pool.
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer())
    }
}

/// TLS key material locations.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub cognito: CognitoConfig,
    pub jwks_cache_ttl: Duration,
    pub tls: Option<TlsConfig>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: "HOST",
                    reason: e.to_string(),
                })?;

        let data_dir = PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let region = required(&get, "COGNITO_REGION", "REGION")?;
        let user_pool_id = required(&get, "COGNITO_USER_POOL_ID", "USER_POOL_ID")?;
        let client_id = required(&get, "COGNITO_CLIENT_ID", "CLIENT_ID")?;
        let client_secret = required(&get, "COGNITO_CLIENT_SECRET", "CLIENT_SECRET")?;

        let endpoint_raw = get("COGNITO_ENDPOINT")
            .unwrap_or_else(|| format!("https://cognito-idp.{region}.amazonaws.com"));
        let endpoint = Url::parse(&endpoint_raw).map_err(|e| ConfigError::Invalid {
            name: "COGNITO_ENDPOINT",
            reason: e.to_string(),
        })?;

        let jwks_cache_ttl = match get("JWKS_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|e| {
                ConfigError::Invalid {
                    name: "JWKS_CACHE_TTL_SECS",
                    reason: e.to_string(),
                }
            })?),
            None => Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECS),
        };

        let tls = match (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("TLS_KEY_PATH")),
            (None, Some(_)) => return Err(ConfigError::Missing("TLS_CERT_PATH")),
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    reason: format!("expected 'json' or 'pretty', got '{other}'"),
                })
            }
        };

        Ok(Self {
            bind_addr,
            data_dir,
            cognito: CognitoConfig {
                region,
                user_pool_id,
                client_id,
                client_secret,
                endpoint,
            },
            jwks_cache_ttl,
            tls,
            log_format,
        })
    }

    /// Path of the redb user database.
    pub fn user_db_path(&self) -> PathBuf {
        self.data_dir.join(USER_DB_FILE)
    }
}

fn required<G>(get: &G, name: &'static str, alias: &str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(name)
        .or_else(|| get(alias))
        .ok_or(ConfigError::Missing(name))
}
