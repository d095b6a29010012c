// Read-only queries feeding dashboards and the `report` command.

use crate::db::ledger::record_from_row;
use crate::models::{AddressRecord, HistoryPoint, WalletTotals};
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub use crate::db::ledger::{address_count, wallet_totals};

/// History points with `from <= day <= to`, in day order.
pub async fn history_range(
    pool: &SqlitePool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<HistoryPoint>, sqlx::Error> {
    sqlx::query_as::<_, HistoryPoint>(
        "SELECT day, lth AS lth_total, sth AS sth_total FROM history
         WHERE day BETWEEN ? AND ?
         ORDER BY day ASC",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

pub async fn latest_history(pool: &SqlitePool) -> Result<Option<HistoryPoint>, sqlx::Error> {
    sqlx::query_as::<_, HistoryPoint>(
        "SELECT day, lth AS lth_total, sth AS sth_total FROM history ORDER BY day DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
}

/// Largest ledger balances, ties broken by address.
pub async fn top_addresses(pool: &SqlitePool, limit: i64) -> Result<Vec<AddressRecord>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT address, balance, wallet FROM addresses
         ORDER BY balance DESC, address ASC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

/// Combined snapshot of the ledger for reporting.
pub async fn ledger_summary(
    pool: &SqlitePool,
    top: i64,
) -> Result<(Option<HistoryPoint>, WalletTotals, Vec<AddressRecord>), sqlx::Error> {
    let latest = latest_history(pool).await?;
    let totals = wallet_totals(pool).await?;
    let top = top_addresses(pool, top).await?;
    Ok((latest, totals, top))
}
