//! Configuration management for the DocDesk server

use std::env;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::render::RenderEngineConfig;
use crate::view::{Capabilities, ViewOptions};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub view: ViewConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON seed file for the memory backend
    pub seed_file: Option<String>,
    pub database_url: String,
    pub s3: S3Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub provider: StorageProvider,
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: Option<String>,
    /// Key prefix in front of `<partition>/<id>.json`
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Minio,
    R2,
    S3,
    B2,
}

#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub capabilities: Capabilities,
    pub home_route: String,
    /// Per-viewer views kept before the least recent is torn down
    pub sessions_max: usize,
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub max_concurrent: usize,
    pub timeout_secs: u64,
    pub cache_pages: usize,
}

/// Invalid configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be true or false, got {value:?}")]
    InvalidBool { key: &'static str, value: String },

    #[error("STORE_BACKEND must be memory, sqlite or s3, got {0:?}")]
    InvalidBackend(String),

    #[error("HOME_ROUTE must start with '/', got {0:?}")]
    InvalidHomeRoute(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                seed_file: None,
                database_url: "sqlite:./docdesk.db".to_string(),
                s3: S3Config {
                    provider: StorageProvider::Minio,
                    endpoint: "http://localhost:9000".to_string(),
                    bucket: "docdesk".to_string(),
                    access_key: "admin".to_string(),
                    secret_key: "password123".to_string(),
                    region: Some("us-east-1".to_string()),
                    prefix: String::new(),
                },
            },
            view: ViewConfig {
                capabilities: Capabilities::FULL,
                home_route: "/".to_string(),
                sessions_max: 1024,
            },
            render: RenderConfig {
                max_concurrent: 4,
                timeout_secs: 30,
                cache_pages: 256,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("STORE_BACKEND") {
            None => defaults.store.backend,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "sqlite" => StoreBackend::Sqlite,
                "s3" => StoreBackend::S3,
                _ => return Err(ConfigError::InvalidBackend(value)),
            },
        };

        let home_route = get("HOME_ROUTE").unwrap_or(defaults.view.home_route);
        if !home_route.starts_with('/') {
            return Err(ConfigError::InvalidHomeRoute(home_route));
        }

        let s3 = defaults.store.s3;
        Ok(Config {
            server: ServerConfig {
                host: get("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_number("SERVER_PORT", get("SERVER_PORT"), defaults.server.port)?,
            },
            store: StoreConfig {
                backend,
                seed_file: get("STORE_SEED_FILE"),
                database_url: get("DATABASE_URL").unwrap_or(defaults.store.database_url),
                s3: S3Config {
                    provider: match get("S3_PROVIDER")
                        .unwrap_or_else(|| "minio".to_string())
                        .as_str()
                    {
                        "r2" => StorageProvider::R2,
                        "s3" => StorageProvider::S3,
                        "b2" => StorageProvider::B2,
                        _ => StorageProvider::Minio,
                    },
                    endpoint: get("S3_ENDPOINT").unwrap_or(s3.endpoint),
                    bucket: get("S3_BUCKET").unwrap_or(s3.bucket),
                    access_key: get("S3_ACCESS_KEY").unwrap_or(s3.access_key),
                    secret_key: get("S3_SECRET_KEY").unwrap_or(s3.secret_key),
                    region: get("S3_REGION").or(s3.region),
                    prefix: get("S3_PREFIX").unwrap_or(s3.prefix),
                },
            },
            view: ViewConfig {
                capabilities: Capabilities {
                    can_delete: parse_bool(
                        "VIEW_CAN_DELETE",
                        get("VIEW_CAN_DELETE"),
                        defaults.view.capabilities.can_delete,
                    )?,
                    can_download: parse_bool(
                        "VIEW_CAN_DOWNLOAD",
                        get("VIEW_CAN_DOWNLOAD"),
                        defaults.view.capabilities.can_download,
                    )?,
                },
                home_route,
                sessions_max: parse_number(
                    "VIEW_SESSIONS_MAX",
                    get("VIEW_SESSIONS_MAX"),
                    defaults.view.sessions_max,
                )?,
            },
            render: RenderConfig {
                max_concurrent: parse_number(
                    "RENDER_MAX_CONCURRENT",
                    get("RENDER_MAX_CONCURRENT"),
                    defaults.render.max_concurrent,
                )?,
                timeout_secs: parse_number(
                    "RENDER_TIMEOUT_SECS",
                    get("RENDER_TIMEOUT_SECS"),
                    defaults.render.timeout_secs,
                )?,
                cache_pages: parse_number(
                    "RENDER_CACHE_PAGES",
                    get("RENDER_CACHE_PAGES"),
                    defaults.render.cache_pages,
                )?,
            },
        })
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            capabilities: self.view.capabilities,
            home_route: self.view.home_route.clone(),
            render_concurrency: self.render.max_concurrent.max(1),
        }
    }

    pub fn render_engine(&self) -> RenderEngineConfig {
        RenderEngineConfig {
            max_concurrent: self.render.max_concurrent.max(1),
            timeout: Duration::from_secs(self.render.timeout_secs.max(1)),
            page_cache_capacity: self.render.cache_pages,
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
    }
}

fn parse_bool(
    key: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { key, value: raw }),
        },
    }
}
