use crate::error::ConfigError;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_APPWRITE_ENDPOINT: &str = "https://sgp.cloud.appwrite.io/v1";
const DEFAULT_DEBOUNCE_MS: u64 = 500;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TRENDING_LIMIT: usize = 5;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3146";

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb: TmdbConfig,
    pub store: StoreConfig,
    pub debounce: Duration,
    pub trending_limit: usize,
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Appwrite(AppwriteConfig),
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!("All required environment variables are set");
        Ok(config)
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let timeout = Duration::from_secs(parse_or(
            get("HTTP_TIMEOUT_SECS"),
            "HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);

        let tmdb = TmdbConfig {
            api_key: require("TMDB_API_KEY")?,
            base_url: get("TMDB_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TMDB_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout,
        };

        let backend = get("POPULARITY_BACKEND").unwrap_or_else(|| "appwrite".to_string());
        let store = match backend.to_lowercase().as_str() {
            "appwrite" => StoreConfig::Appwrite(AppwriteConfig {
                endpoint: get("APPWRITE_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_APPWRITE_ENDPOINT.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                project_id: require("APPWRITE_PROJECT_ID")?,
                database_id: require("APPWRITE_DATABASE_ID")?,
                collection_id: require("APPWRITE_COLLECTION_ID")?,
                api_key: get("APPWRITE_API_KEY"),
                timeout,
            }),
            "memory" => StoreConfig::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    key: "POPULARITY_BACKEND",
                    reason: format!("expected 'appwrite' or 'memory', got '{}'", other),
                })
            }
        };

        let debounce = Duration::from_millis(parse_or(
            get("SEARCH_DEBOUNCE_MS"),
            "SEARCH_DEBOUNCE_MS",
            DEFAULT_DEBOUNCE_MS,
        )?);
        let trending_limit = parse_or(
            get("TRENDING_LIMIT"),
            "TRENDING_LIMIT",
            DEFAULT_TRENDING_LIMIT,
        )?;
        let bind_addr = parse_or(
            get("BIND_ADDR"),
            "BIND_ADDR",
            DEFAULT_BIND_ADDR
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::Invalid {
                    key: "BIND_ADDR",
                    reason: e.to_string(),
                })?,
        )?;

        Ok(Self {
            tmdb,
            store,
            debounce,
            trending_limit,
            bind_addr,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
