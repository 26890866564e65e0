use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::store::{AttemptStore, MongoAttemptStore, SqliteAttemptStore};
use practice_service::PracticeSessionStore;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AttemptStore>,
    pub practice_sessions: Arc<PracticeSessionStore>,
}

impl AppState {
    /// Opens the configured store and checks that it answers.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn AttemptStore> = match config.storage_backend {
            StorageBackend::Sqlite => {
                tracing::info!("Opening SQLite store at {}", config.sqlite_path);
                Arc::new(SqliteAttemptStore::open(&config.sqlite_path)?)
            }
            StorageBackend::Mongo => {
                let uri = config
                    .mongo_uri
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("MongoDB backend selected without a URI"))?;
                tracing::info!("Connecting to MongoDB database {}", config.mongo_database);
                Arc::new(MongoAttemptStore::connect(uri, &config.mongo_database).await?)
            }
        };

        tokio::time::timeout(std::time::Duration::from_secs(5), store.ping())
            .await
            .map_err(|_| anyhow::anyhow!("{} store ping timeout after 5s", store.backend()))??;

        tracing::info!("{} store ready", store.backend());

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn AttemptStore>) -> Self {
        let practice_sessions = Arc::new(PracticeSessionStore::new(
            config.practice_session_ttl_seconds,
        ));
        Self {
            config,
            store,
            practice_sessions,
        }
    }
}

pub mod attempt_service;
pub mod classifier;
pub mod export_service;
pub mod practice_service;
pub mod question_bank;
pub mod rulebook;
pub mod stats_service;
