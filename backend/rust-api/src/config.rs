use serde::Deserialize;
use std::env;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_SQLITE_PATH: &str = "step2hub.db";
pub const DEFAULT_MONGO_DATABASE: &str = "step2hub";
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 3600;
pub const DEFAULT_RECENT_WINDOW: usize = 20;
pub const DEFAULT_RECENT_ENTRIES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Mongo,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Mongo => "mongo",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(StorageBackend::Sqlite),
            "mongo" | "mongodb" => Some(StorageBackend::Mongo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub storage_backend: StorageBackend,
    pub sqlite_path: String,
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
    pub practice_session_ttl_seconds: i64,
    pub stats_recent_window: usize,
    pub stats_recent_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            storage_backend: StorageBackend::Sqlite,
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            mongo_uri: None,
            mongo_database: DEFAULT_MONGO_DATABASE.to_string(),
            practice_session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            stats_recent_window: DEFAULT_RECENT_WINDOW,
            stats_recent_entries: DEFAULT_RECENT_ENTRIES,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first (two levels up), then the local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .ok()
            .filter(|uri| !uri.trim().is_empty());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| DEFAULT_MONGO_DATABASE.to_string());

        let storage_backend = match settings
            .get_string("storage.backend")
            .or_else(|_| env::var("STEP2HUB_STORAGE"))
        {
            Ok(raw) => StorageBackend::parse(&raw).ok_or_else(|| {
                config::ConfigError::Message(format!(
                    "storage.backend must be 'sqlite' or 'mongo', got '{}'",
                    raw
                ))
            })?,
            Err(_) if mongo_uri.is_some() => StorageBackend::Mongo,
            Err(_) => StorageBackend::Sqlite,
        };

        if storage_backend == StorageBackend::Mongo && mongo_uri.is_none() {
            return Err(config::ConfigError::Message(
                "storage.backend is 'mongo' but no database.mongo_uri / MONGO_URI is set".into(),
            ));
        }

        let sqlite_path = settings
            .get_string("storage.sqlite_path")
            .or_else(|_| env::var("STEP2HUB_SQLITE"))
            .unwrap_or_else(|_| DEFAULT_SQLITE_PATH.to_string());

        let practice_session_ttl_seconds = settings
            .get_int("practice.session_ttl_seconds")
            .ok()
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS);

        let stats_recent_window = read_count(&settings, "stats.recent_window")
            .unwrap_or(DEFAULT_RECENT_WINDOW);
        let stats_recent_entries = read_count(&settings, "stats.recent_entries")
            .unwrap_or(DEFAULT_RECENT_ENTRIES);

        Ok(Config {
            bind_addr,
            storage_backend,
            sqlite_path,
            mongo_uri,
            mongo_database,
            practice_session_ttl_seconds,
            stats_recent_window,
            stats_recent_entries,
        })
    }
}

fn read_count(settings: &config::Config, key: &str) -> Option<usize> {
    settings
        .get_int(key)
        .ok()
        .and_then(|value| usize::try_from(value).ok())
        .filter(|value| *value > 0)
}
