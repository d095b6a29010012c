use crate::models::ChangeLogEntry;
use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};

/// Records the day's balance for an address; a second record for the same day replaces the first.
pub async fn record<'e, E>(executor: E, address: &str, balance: i64, day: NaiveDate) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO logs (address, balance, day) VALUES (?, ?, ?)
         ON CONFLICT(address, day) DO UPDATE SET balance = excluded.balance",
    )
    .bind(address)
    .bind(balance)
    .bind(day)
    .execute(executor)
    .await?;

    Ok(())
}

/// Entries for `address` with `from <= day <= to`, oldest first.
pub async fn entries_between<'e, E>(
    executor: E,
    address: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ChangeLogEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ChangeLogEntry>(
        "SELECT address, balance, day FROM logs
         WHERE address = ? AND day BETWEEN ? AND ?
         ORDER BY day ASC",
    )
    .bind(address)
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await
}

pub async fn entries_for_address<'e, E>(executor: E, address: &str) -> Result<Vec<ChangeLogEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ChangeLogEntry>(
        "SELECT address, balance, day FROM logs WHERE address = ? ORDER BY day ASC",
    )
    .bind(address)
    .fetch_all(executor)
    .await
}
