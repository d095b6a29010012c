// Configuration for both batch jobs:
// - ledger database and remote source connection strings
// - partition directory and checkpoint file locations
// - fetch window size and optional rate limit
// - classification thresholds and sweep chunk size

use crate::error::PipelineError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Base of the logarithm used by the Stage 2 age weights.
pub const WEIGHT_LOG_BASE: f64 = 180.0;

/// Upper bound for the inactivity threshold, roughly ten years.
pub const MAX_THRESHOLD_DAYS: u32 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub source_database_url: String,
    pub source_timeout: Duration,
    pub fetch_rate_limit: Option<u32>,
    pub partition_dir: PathBuf,
    pub ingest_checkpoint: PathBuf,
    pub classify_checkpoint: PathBuf,
    pub fetch_window: Duration,
    pub genesis_date: NaiveDate,
    pub genesis_time: NaiveTime,
    pub classification: ClassificationParams,
    pub sweep_chunk_size: u32,
}

/// Tunables of the two-stage holder rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationParams {
    /// Days without any balance change after which an address is a long-term holder.
    pub threshold_days: u32,
    /// Length of the weighted realized-balance window.
    pub window_size_days: u32,
}

impl Default for ClassificationParams {
    fn default() -> Self {
        Self {
            threshold_days: 155,
            window_size_days: 178,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:ledger.db".to_string());
        let source_database_url = env::var("SOURCE_DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost:5432/ethereum_ethereum_mainnet".to_string());
        let source_timeout = env::var("SOURCE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let fetch_rate_limit = env::var("FETCH_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None);
        let partition_dir = env::var("PARTITION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dbs"));
        let ingest_checkpoint = env::var("INGEST_CHECKPOINT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("status.cache"));
        let classify_checkpoint = env::var("CLASSIFY_CHECKPOINT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("status.calc"));
        let fetch_window = env::var("FETCH_WINDOW_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(300));
        let genesis_date = env::var("GENESIS_DATE")
            .ok()
            .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
            .unwrap_or_else(default_genesis_date);
        let genesis_time = env::var("GENESIS_TIME")
            .ok()
            .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M:%S").ok())
            .unwrap_or_else(default_genesis_time);

        let defaults = ClassificationParams::default();
        let threshold_days = env::var("WALLET_THRESHOLD_DAYS")
            .map(|v| v.parse().unwrap_or(defaults.threshold_days))
            .unwrap_or(defaults.threshold_days);
        let window_size_days = env::var("WINDOW_SIZE_DAYS")
            .map(|v| v.parse().unwrap_or(defaults.window_size_days))
            .unwrap_or(defaults.window_size_days);
        let sweep_chunk_size = env::var("SWEEP_CHUNK_SIZE")
            .map(|v| v.parse().unwrap_or(1000))
            .unwrap_or(1000);

        Self {
            database_url,
            source_database_url,
            source_timeout,
            fetch_rate_limit,
            partition_dir,
            ingest_checkpoint,
            classify_checkpoint,
            fetch_window,
            genesis_date,
            genesis_time,
            classification: ClassificationParams {
                threshold_days,
                window_size_days,
            },
            sweep_chunk_size,
        }
    }

    /// Cross-field checks that `from_env` cannot express through defaults.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.fetch_window.as_secs() == 0 {
            return Err(PipelineError::Config("FETCH_WINDOW_SECS must be positive".into()));
        }
        if self.sweep_chunk_size == 0 {
            return Err(PipelineError::Config("SWEEP_CHUNK_SIZE must be positive".into()));
        }
        if self.classification.threshold_days == 0 {
            return Err(PipelineError::Config("WALLET_THRESHOLD_DAYS must be positive".into()));
        }
        if self.classification.threshold_days > MAX_THRESHOLD_DAYS {
            return Err(PipelineError::Config(format!(
                "WALLET_THRESHOLD_DAYS must be at most {}",
                MAX_THRESHOLD_DAYS
            )));
        }
        // The oldest age in the window is window_size + 1 and must keep a positive weight.
        if f64::from(self.classification.window_size_days.saturating_add(1)) >= WEIGHT_LOG_BASE {
            return Err(PipelineError::Config(format!(
                "WINDOW_SIZE_DAYS must be below {}",
                WEIGHT_LOG_BASE as u32 - 1
            )));
        }
        if self.fetch_rate_limit == Some(0) {
            return Err(PipelineError::Config("FETCH_RATE_LIMIT must be positive when set".into()));
        }
        Ok(())
    }

    /// First instant the ingestion job fetches when it has no checkpoint.
    pub fn genesis_instant(&self) -> NaiveDateTime {
        self.genesis_date.and_time(self.genesis_time)
    }
}

fn default_genesis_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 7, 30).unwrap_or_default()
}

fn default_genesis_time() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default()
}

#[cfg(test)]
impl Config {
    /// Configuration rooted in a scratch directory, independent of the environment.
    pub fn for_dir(dir: &std::path::Path) -> Self {
        Self {
            database_url: format!("sqlite:{}", dir.join("ledger.db").display()),
            source_database_url: String::new(),
            source_timeout: Duration::from_secs(5),
            fetch_rate_limit: None,
            partition_dir: dir.join("dbs"),
            ingest_checkpoint: dir.join("status.cache"),
            classify_checkpoint: dir.join("status.calc"),
            fetch_window: Duration::from_secs(300),
            genesis_date: default_genesis_date(),
            genesis_time: default_genesis_time(),
            classification: ClassificationParams::default(),
            sweep_chunk_size: 1000,
        }
    }
}
