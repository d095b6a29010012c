use crate::classify::engine::ClassificationEngine;
use crate::db::{history, ledger};
use crate::error::PipelineError;
use crate::models::{HistoryPoint, Wallet};
use crate::units::szabo_to_ether;
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepSummary {
    pub addresses: u64,
    pub long_term: u64,
    pub short_term: u64,
    pub wallet_changes: u64,
    pub history: HistoryPoint,
}

/// Reclassifies every ledger address as of `reference_day` and records the day's totals.
///
/// Wallet writes and the history point commit together; on any error nothing
/// of the sweep is kept and the day can simply be swept again.
pub async fn run_daily_sweep(
    pool: &SqlitePool,
    engine: &ClassificationEngine,
    reference_day: NaiveDate,
    chunk_size: u32,
) -> Result<SweepSummary, PipelineError> {
    let mut tx = pool.begin().await?;

    let mut summary = sweep_addresses(&mut tx, engine, reference_day, chunk_size).await?;
    summary.history = write_history_point(&mut tx, reference_day).await?;

    tx.commit().await?;

    debug!("Sweep for {} changed {} wallets", reference_day, summary.wallet_changes);
    Ok(summary)
}

async fn sweep_addresses(
    conn: &mut SqliteConnection,
    engine: &ClassificationEngine,
    reference_day: NaiveDate,
    chunk_size: u32,
) -> Result<SweepSummary, PipelineError> {
    let total = ledger::address_count(&mut *conn).await?;
    let mut summary = SweepSummary {
        addresses: 0,
        long_term: 0,
        short_term: 0,
        wallet_changes: 0,
        history: HistoryPoint {
            day: reference_day,
            lth_total: 0.0,
            sth_total: 0.0,
        },
    };
    let mut after: Option<String> = None;

    loop {
        let chunk = ledger::fetch_chunk(&mut *conn, after.as_deref(), chunk_size).await?;
        if chunk.is_empty() {
            break;
        }

        for record in &chunk {
            let verdict = engine
                .classify(&mut *conn, &record.address, reference_day, record.balance)
                .await?;
            let wallet = verdict.wallet();

            if wallet != record.wallet {
                ledger::set_wallet(&mut *conn, &record.address, wallet).await?;
                summary.wallet_changes += 1;
            }

            match wallet {
                Wallet::LongTerm => summary.long_term += 1,
                Wallet::ShortTerm => summary.short_term += 1,
            }
        }

        summary.addresses += chunk.len() as u64;
        debug!("Classified {}/{} addresses for {}", summary.addresses, total, reference_day);

        if chunk.len() < chunk_size as usize {
            break;
        }
        after = chunk.last().map(|record| record.address.clone());
    }

    Ok(summary)
}

async fn write_history_point(
    conn: &mut SqliteConnection,
    reference_day: NaiveDate,
) -> Result<HistoryPoint, PipelineError> {
    let totals = ledger::wallet_totals(&mut *conn).await?;
    let point = HistoryPoint {
        day: reference_day,
        lth_total: szabo_to_ether(totals.lth),
        sth_total: szabo_to_ether(totals.sth),
    };

    history::upsert(&mut *conn, &point).await?;
    debug!("History point for {}: {:?}", reference_day, point);
    Ok(point)
}
