use crate::checkpoint::CheckpointStore;
use crate::error::PipelineError;
use crate::models::BalanceSnapshot;
use crate::pipeline::StopReason;
use crate::snapshot::{PartitionStore, SnapshotPartition};
use crate::source::{BalanceSource, RawBalance};
use crate::units::wei_to_szabo;
use crate::validation::validate_address;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    pub windows: u64,
    pub rows: u64,
    pub skipped: u64,
    pub cursor: NaiveDateTime,
    pub stop: StopReason,
}

enum DayOutcome {
    Complete,
    Interrupted,
}

/// End of the fetch window starting at `begin`, never past the following midnight.
pub fn window_end(begin: NaiveDateTime, window: std::time::Duration) -> NaiveDateTime {
    let next_midnight = (begin.date() + Duration::days(1)).and_time(chrono::NaiveTime::MIN);
    let end = begin + Duration::seconds(window.as_secs() as i64);
    end.min(next_midnight)
}

/// Pulls balance windows from `source` into day partitions until `until` (exclusive).
///
/// The ingestion cursor is persisted after every stored window. A fetch
/// failure ends the run with the cursor still at the failed window.
pub async fn run_ingestion<S: BalanceSource>(
    source: &S,
    partitions: &PartitionStore,
    checkpoints: &CheckpointStore,
    window: std::time::Duration,
    until: NaiveDate,
    shutdown: &CancellationToken,
) -> Result<IngestionSummary, PipelineError> {
    let mut summary = IngestionSummary {
        windows: 0,
        rows: 0,
        skipped: 0,
        cursor: checkpoints.load_ingestion()?,
        stop: StopReason::CaughtUp,
    };

    info!("Starting ingestion from {} until {}", summary.cursor, until);

    while summary.cursor.date() < until {
        if shutdown.is_cancelled() {
            summary.stop = StopReason::Interrupted;
            break;
        }

        let partition = partitions.open_or_create(summary.cursor.date()).await?;
        let outcome = ingest_day(source, &partition, checkpoints, window, &mut summary, shutdown).await;
        partition.close().await;

        if let DayOutcome::Interrupted = outcome? {
            summary.stop = StopReason::Interrupted;
            break;
        }
    }

    info!(
        "Ingestion stopped ({}) at {}: {} windows, {} rows, {} skipped",
        summary.stop, summary.cursor, summary.windows, summary.rows, summary.skipped
    );
    Ok(summary)
}

async fn ingest_day<S: BalanceSource>(
    source: &S,
    partition: &SnapshotPartition,
    checkpoints: &CheckpointStore,
    window: std::time::Duration,
    summary: &mut IngestionSummary,
    shutdown: &CancellationToken,
) -> Result<DayOutcome, PipelineError> {
    let day = partition.day();

    while summary.cursor.date() == day {
        let begin = summary.cursor;
        let end = window_end(begin, window);

        let rows = source
            .fetch_window(begin, end)
            .await
            .map_err(|source| PipelineError::Fetch { begin, end, source })?;
        let fetched = rows.len();

        let (snapshots, skipped) = to_snapshots(rows)?;
        partition.upsert_batch(&snapshots).await?;
        checkpoints.save_ingestion(end)?;

        summary.cursor = end;
        summary.windows += 1;
        summary.rows += snapshots.len() as u64;
        summary.skipped += skipped;
        info!("{} records retrieved for {} .. {}, stored", fetched, begin, end);

        if shutdown.is_cancelled() {
            return Ok(DayOutcome::Interrupted);
        }
    }

    Ok(DayOutcome::Complete)
}

/// Scales source rows to snapshot units; rows with malformed addresses are skipped.
fn to_snapshots(rows: Vec<RawBalance>) -> Result<(Vec<BalanceSnapshot>, u64), PipelineError> {
    let mut snapshots = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for row in rows {
        if let Err(e) = validate_address(&row.address) {
            warn!("Skipping balance row at block {}: {}", row.block, e);
            skipped += 1;
            continue;
        }

        snapshots.push(BalanceSnapshot {
            block: row.block,
            address: row.address.to_ascii_lowercase(),
            balance: wei_to_szabo(row.balance_wei)?,
            observed_at: row.timestamp,
        });
    }

    Ok((snapshots, skipped))
}
