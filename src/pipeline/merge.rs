use crate::db::{changelog, ledger};
use crate::error::PipelineError;
use crate::models::BalanceSnapshot;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub snapshots: usize,
    pub closed: usize,
}

/// Folds one day partition into the address ledger and the change log, all or nothing.
///
/// Each open position updates (or creates) its ledger row and becomes the
/// day's change log entry for that address. Closed positions zero the ledger
/// balance of addresses the ledger already knows. Merging the same day twice
/// leaves the same state as merging it once.
pub async fn merge_day(
    pool: &SqlitePool,
    day: NaiveDate,
    snapshots: &[BalanceSnapshot],
    closures: &[String],
) -> Result<MergeSummary, PipelineError> {
    let mut tx = pool.begin().await?;
    let mut summary = MergeSummary::default();

    for snapshot in snapshots {
        ledger::upsert_balance(&mut *tx, &snapshot.address, snapshot.balance).await?;
        changelog::record(&mut *tx, &snapshot.address, snapshot.balance, day).await?;
        summary.snapshots += 1;
    }

    for address in closures {
        if ledger::close_position(&mut *tx, address).await? {
            changelog::record(&mut *tx, address, 0, day).await?;
            summary.closed += 1;
        } else {
            debug!("Ignoring closure of untracked address {}", address);
        }
    }

    tx.commit().await?;
    Ok(summary)
}
