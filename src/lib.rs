pub mod checkpoint;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod snapshot;
pub mod source;
pub mod state;
pub mod units;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use checkpoint::CheckpointStore;
pub use classify::{run_daily_sweep, ClassificationEngine, Verdict};
pub use config::{ClassificationParams, Config};
pub use error::PipelineError;
pub use models::{AddressRecord, BalanceSnapshot, ChangeLogEntry, HistoryPoint, Wallet};
pub use pipeline::{run_classification, run_ingestion, StopReason};
pub use snapshot::{PartitionStore, SnapshotPartition};
pub use source::{BalanceSource, PgBalanceSource, RawBalance};
pub use state::AppState;
