use crate::models::HistoryPoint;
use sqlx::{Executor, Sqlite};

/// Inserts the day's totals or replaces them when the day is classified again.
pub async fn upsert<'e, E>(executor: E, point: &HistoryPoint) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO history (day, lth, sth) VALUES (?, ?, ?)
         ON CONFLICT(day) DO UPDATE SET lth = excluded.lth, sth = excluded.sth",
    )
    .bind(point.day)
    .bind(point.lth_total)
    .bind(point.sth_total)
    .execute(executor)
    .await?;

    Ok(())
}
