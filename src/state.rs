use crate::checkpoint::CheckpointStore;
use crate::classify::ClassificationEngine;
use crate::config::Config;
use crate::db::connection::establish_connection;
use crate::error::PipelineError;
use crate::snapshot::PartitionStore;
use sqlx::SqlitePool;
use tracing::info;

pub struct AppState {
    pub config: Config,
    pub db_pool: SqlitePool,
    pub partitions: PartitionStore,
    pub checkpoints: CheckpointStore,
    pub engine: ClassificationEngine,
}

impl AppState {
    /// Opens the ledger database; failure here is fatal before any work starts.
    pub async fn connect(config: Config) -> Result<Self, PipelineError> {
        let db_pool = establish_connection(&config.database_url)
            .await
            .map_err(PipelineError::Connection)?;
        info!("Ledger database ready at {}", config.database_url);

        Ok(Self::with_pool(config, db_pool))
    }

    pub fn with_pool(config: Config, db_pool: SqlitePool) -> Self {
        let partitions = PartitionStore::new(&config.partition_dir);
        let checkpoints = checkpoint_store(&config);
        let engine = ClassificationEngine::new(config.classification);

        Self {
            config,
            db_pool,
            partitions,
            checkpoints,
            engine,
        }
    }
}

pub fn checkpoint_store(config: &Config) -> CheckpointStore {
    CheckpointStore::new(
        &config.ingest_checkpoint,
        &config.classify_checkpoint,
        config.genesis_instant(),
    )
}
