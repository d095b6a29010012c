//! tests/common.rs - Shared fixtures for the integration-style tests

use crate::{
    config::Config,
    db::connection,
    models::BalanceSnapshot,
    source::{BalanceSource, RawBalance, SourceError},
    state::AppState,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const SZABO_PER_ETHER: i64 = 1_000_000;
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Fresh ledger database and partition directory under a temp dir.
/// Keep the `TempDir` alive for the duration of the test.
pub async fn setup() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = Config::for_dir(dir.path());
    let pool = connection::establish_connection(&config.database_url)
        .await
        .expect("Failed to connect to database");
    (dir, AppState::with_pool(config, pool))
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(day: NaiveDate, h: u32, min: u32, s: u32) -> NaiveDateTime {
    day.and_hms_opt(h, min, s).unwrap()
}

/// Deterministic, well-formed address for index `n`.
pub fn addr(n: u32) -> String {
    format!("0x{:040x}", n)
}

pub fn snapshot(address: &str, balance: i64, observed_at: NaiveDateTime) -> BalanceSnapshot {
    BalanceSnapshot {
        block: observed_at.and_utc().timestamp(),
        address: address.to_string(),
        balance,
        observed_at,
    }
}

pub fn raw(address: &str, ether: u128, timestamp: NaiveDateTime) -> RawBalance {
    RawBalance {
        block: timestamp.and_utc().timestamp(),
        address: address.to_string(),
        balance_wei: ether * WEI_PER_ETHER,
        timestamp,
    }
}

/// Writes one partition file the way ingestion would.
pub async fn write_partition(state: &AppState, day: NaiveDate, snapshots: &[BalanceSnapshot]) {
    let partition = state.partitions.open_or_create(day).await.unwrap();
    partition.upsert_batch(snapshots).await.unwrap();
    partition.close().await;
}

/// In-memory balance source serving a fixed set of rows.
pub struct MemorySource {
    rows: Vec<RawBalance>,
    fail_from: Option<NaiveDateTime>,
    cancel_after: Option<(usize, CancellationToken)>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(rows: Vec<RawBalance>) -> Self {
        Self {
            rows,
            fail_from: None,
            cancel_after: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every window ending after `instant` fails.
    pub fn failing_from(mut self, instant: NaiveDateTime) -> Self {
        self.fail_from = Some(instant);
        self
    }

    /// Cancels `token` while serving the `calls`-th window.
    pub fn cancelling_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BalanceSource for MemorySource {
    async fn fetch_window(
        &self,
        begin: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<RawBalance>, SourceError> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(fail_from) = self.fail_from {
            if end > fail_from {
                return Err(SourceError::Unavailable(format!("window {} .. {}", begin, end)));
            }
        }

        if let Some((after, token)) = &self.cancel_after {
            if calls >= *after {
                token.cancel();
            }
        }

        Ok(self
            .rows
            .iter()
            .filter(|row| row.timestamp >= begin && row.timestamp < end)
            .cloned()
            .collect())
    }
}
