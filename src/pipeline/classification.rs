//! Day-by-day classification driver.
//!
//! Each day runs `LoadPartition -> MergeChangeLog -> SweepAddresses ->
//! WriteHistoryPoint -> AdvanceCursor`. The cursor is the last step, so a
//! failure anywhere earlier leaves it on the failed day and the next run
//! redoes that day from scratch.

use crate::classify::run_daily_sweep;
use crate::error::PipelineError;
use crate::pipeline::{merge::merge_day, StopReason};
use crate::state::AppState;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStage {
    LoadPartition,
    MergeChangeLog,
    SweepAddresses,
    WriteHistoryPoint,
    AdvanceCursor,
}

impl fmt::Display for DayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayStage::LoadPartition => "load_partition",
            DayStage::MergeChangeLog => "merge_changelog",
            DayStage::SweepAddresses => "sweep_addresses",
            DayStage::WriteHistoryPoint => "write_history_point",
            DayStage::AdvanceCursor => "advance_cursor",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationSummary {
    pub days: u64,
    pub next_day: NaiveDate,
    pub stop: StopReason,
}

/// True once ingestion has moved past the end of `day`.
pub fn day_fully_ingested(day: NaiveDate, ingestion_cursor: NaiveDateTime) -> bool {
    ingestion_cursor >= (day + Duration::days(1)).and_time(NaiveTime::MIN)
}

/// Classifies days from the classification cursor up to `until` (exclusive).
pub async fn run_classification(
    state: &AppState,
    until: NaiveDate,
    shutdown: &CancellationToken,
) -> Result<ClassificationSummary, PipelineError> {
    let checkpoints = &state.checkpoints;
    let mut summary = ClassificationSummary {
        days: 0,
        next_day: checkpoints.load_classification()?,
        stop: StopReason::CaughtUp,
    };

    info!("Starting classification from {} until {}", summary.next_day, until);

    while summary.next_day < until {
        if shutdown.is_cancelled() {
            summary.stop = StopReason::Interrupted;
            break;
        }

        let day = summary.next_day;

        // Re-read every day so progress of a concurrently running ingestion is seen
        let ingestion_cursor = checkpoints.load_ingestion()?;
        if !day_fully_ingested(day, ingestion_cursor) {
            info!("{} is not fully ingested yet (ingestion at {})", day, ingestion_cursor);
            summary.stop = StopReason::WaitingForIngestion;
            break;
        }

        classify_day(state, day).await?;

        let next = day + Duration::days(1);
        checkpoints.save_classification(next)?;
        info!(%day, stage = %DayStage::AdvanceCursor, "{} finished", day);

        summary.next_day = next;
        summary.days += 1;
    }

    info!(
        "Classification stopped ({}): {} days classified, next day {}",
        summary.stop, summary.days, summary.next_day
    );
    Ok(summary)
}

/// Runs every stage of one day except advancing the cursor.
pub async fn classify_day(state: &AppState, day: NaiveDate) -> Result<(), PipelineError> {
    let partition = state.partitions.open_existing(day).await?;
    let snapshots = partition.read_all().await;
    let closures = partition.read_closures().await;
    partition.close().await;
    let (snapshots, closures) = (snapshots?, closures?);
    info!(
        %day,
        stage = %DayStage::LoadPartition,
        "Loaded {} snapshots and {} closures",
        snapshots.len(),
        closures.len()
    );

    let merged = merge_day(&state.db_pool, day, &snapshots, &closures).await?;
    info!(
        %day,
        stage = %DayStage::MergeChangeLog,
        "Merged {} snapshots, closed {} positions",
        merged.snapshots,
        merged.closed
    );

    let swept = run_daily_sweep(
        &state.db_pool,
        &state.engine,
        day,
        state.config.sweep_chunk_size,
    )
    .await?;
    info!(
        %day,
        stage = %DayStage::SweepAddresses,
        "Classified {} addresses ({} LTH, {} STH)",
        swept.addresses,
        swept.long_term,
        swept.short_term
    );
    info!(
        %day,
        stage = %DayStage::WriteHistoryPoint,
        "LTH {:.6} ETH, STH {:.6} ETH",
        swept.history.lth_total,
        swept.history.sth_total
    );

    Ok(())
}
