//! Day-partitioned snapshot files.
//!
//! Every calendar day gets its own SQLite file holding the latest balance per
//! address observed that day. Ingestion creates partitions, classification
//! opens them read-mostly; both derive the file name from the day alone.

use super::PARTITION_SCHEMA;
use crate::error::PipelineError;
use crate::models::BalanceSnapshot;
use chrono::{Datelike, NaiveDate};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locates partition files under one directory.
#[derive(Debug, Clone)]
pub struct PartitionStore {
    dir: PathBuf,
}

impl PartitionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(partition_file_name(day))
    }

    pub fn exists(&self, day: NaiveDate) -> bool {
        self.path_for(day).is_file()
    }

    /// Opens the partition for `day`, creating the file and schema if needed.
    pub async fn open_or_create(&self, day: NaiveDate) -> Result<SnapshotPartition, PipelineError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(day);

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(PARTITION_SCHEMA).execute(&pool).await?;

        info!("Opened snapshot partition {}", path.display());
        Ok(SnapshotPartition { day, path, pool })
    }

    /// Opens a partition that ingestion must already have written.
    pub async fn open_existing(&self, day: NaiveDate) -> Result<SnapshotPartition, PipelineError> {
        let path = self.path_for(day);
        if !path.is_file() {
            return Err(PipelineError::PartitionMissing(day));
        }

        let corrupt = |source| PipelineError::PartitionCorrupt { day, source };
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(false)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(corrupt)?;

        // A file that is not a database only fails once it is read.
        sqlx::query("SELECT COUNT(*) FROM balance")
            .fetch_one(&pool)
            .await
            .map_err(corrupt)?;
        sqlx::query("SELECT COUNT(*) FROM closures")
            .fetch_one(&pool)
            .await
            .map_err(corrupt)?;

        debug!("Opened existing snapshot partition {}", path.display());
        Ok(SnapshotPartition { day, path, pool })
    }
}

/// `cache-<year>-<month>-<day>.sqlite`, month and day unpadded.
pub fn partition_file_name(day: NaiveDate) -> String {
    format!("cache-{}-{}-{}.sqlite", day.year(), day.month(), day.day())
}

/// One open day partition.
pub struct SnapshotPartition {
    day: NaiveDate,
    path: PathBuf,
    pool: SqlitePool,
}

impl SnapshotPartition {
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies a single snapshot. A zero balance closes the position.
    pub async fn upsert(&self, snapshot: &BalanceSnapshot) -> Result<(), PipelineError> {
        let mut conn = self.pool.acquire().await?;
        apply_snapshot(&mut conn, snapshot).await?;
        Ok(())
    }

    /// Applies a whole fetch window atomically, in the given order.
    pub async fn upsert_batch(&self, snapshots: &[BalanceSnapshot]) -> Result<(), PipelineError> {
        let mut tx = self.pool.begin().await?;

        for snapshot in snapshots {
            apply_snapshot(&mut tx, snapshot).await?;
        }

        tx.commit().await?;
        debug!("Stored {} snapshots into partition {}", snapshots.len(), self.day);
        Ok(())
    }

    /// Every open position of the day, ordered by address.
    pub async fn read_all(&self) -> Result<Vec<BalanceSnapshot>, PipelineError> {
        sqlx::query_as::<_, BalanceSnapshot>(
            "SELECT block, address, balance, observed_at FROM balance ORDER BY address",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|source| PipelineError::PartitionCorrupt {
            day: self.day,
            source,
        })
    }

    /// Addresses whose last snapshot of the day reported a zero balance.
    pub async fn read_closures(&self) -> Result<Vec<String>, PipelineError> {
        let rows = sqlx::query("SELECT address FROM closures ORDER BY address")
            .fetch_all(&self.pool)
            .await
            .map_err(|source| PipelineError::PartitionCorrupt {
                day: self.day,
                source,
            })?;

        Ok(rows.iter().map(|row| row.get("address")).collect())
    }

    pub async fn total_balance(&self) -> Result<i64, PipelineError> {
        let total = sqlx::query("SELECT COALESCE(SUM(balance), 0) FROM balance")
            .fetch_one(&self.pool)
            .await?
            .get::<i64, _>(0);
        Ok(total)
    }

    pub async fn top_balances(&self, limit: i64) -> Result<Vec<BalanceSnapshot>, PipelineError> {
        let rows = sqlx::query_as::<_, BalanceSnapshot>(
            "SELECT block, address, balance, observed_at FROM balance
             ORDER BY balance DESC, address ASC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

async fn apply_snapshot(
    conn: &mut SqliteConnection,
    snapshot: &BalanceSnapshot,
) -> Result<(), sqlx::Error> {
    if snapshot.balance == 0 {
        sqlx::query("DELETE FROM balance WHERE address = ?")
            .bind(&snapshot.address)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO closures (address, block, observed_at) VALUES (?, ?, ?)
             ON CONFLICT(address) DO UPDATE SET block = excluded.block, observed_at = excluded.observed_at",
        )
        .bind(&snapshot.address)
        .bind(snapshot.block)
        .bind(snapshot.observed_at)
        .execute(&mut *conn)
        .await?;
    } else {
        sqlx::query(
            r#"
            INSERT INTO balance (address, block, balance, observed_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(address) DO UPDATE SET
                block = excluded.block,
                balance = excluded.balance,
                observed_at = excluded.observed_at
            "#,
        )
        .bind(&snapshot.address)
        .bind(snapshot.block)
        .bind(snapshot.balance)
        .bind(snapshot.observed_at)
        .execute(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM closures WHERE address = ?")
            .bind(&snapshot.address)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
