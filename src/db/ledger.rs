use crate::models::{AddressRecord, Wallet, WalletTotals};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

/// Creates the address as a short-term holder on first sighting, otherwise updates its balance.
pub async fn upsert_balance<'e, E>(executor: E, address: &str, balance: i64) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO addresses (address, balance, wallet) VALUES (?, ?, ?)
         ON CONFLICT(address) DO UPDATE SET balance = excluded.balance",
    )
    .bind(address)
    .bind(balance)
    .bind(Wallet::ShortTerm.code())
    .execute(executor)
    .await?;

    Ok(())
}

/// Zeroes the balance of a closed position. Returns false for unknown addresses.
pub async fn close_position<'e, E>(executor: E, address: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE addresses SET balance = 0 WHERE address = ?")
        .bind(address)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_wallet<'e, E>(executor: E, address: &str, wallet: Wallet) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE addresses SET wallet = ? WHERE address = ?")
        .bind(wallet.code())
        .bind(address)
        .execute(executor)
        .await?;

    Ok(())
}

/// Next page of addresses strictly after `after`, ordered by address.
pub async fn fetch_chunk<'e, E>(
    executor: E,
    after: Option<&str>,
    limit: u32,
) -> Result<Vec<AddressRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT address, balance, wallet FROM addresses
         WHERE address > ?
         ORDER BY address ASC
         LIMIT ?",
    )
    .bind(after.unwrap_or(""))
    .bind(i64::from(limit))
    .fetch_all(executor)
    .await?;

    rows.iter().map(record_from_row).collect()
}

pub async fn get_address<'e, E>(executor: E, address: &str) -> Result<Option<AddressRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT address, balance, wallet FROM addresses WHERE address = ?")
        .bind(address)
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(record_from_row).transpose()
}

pub async fn wallet_totals<'e, E>(executor: E) -> Result<WalletTotals, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query("SELECT wallet, SUM(balance) AS total FROM addresses GROUP BY wallet")
        .fetch_all(executor)
        .await?;

    let mut totals = WalletTotals::default();
    for row in &rows {
        let code: String = row.try_get("wallet")?;
        let total: i64 = row.try_get::<Option<i64>, _>("total")?.unwrap_or(0);
        match Wallet::from_code(&code) {
            Some(Wallet::LongTerm) => totals.lth = total,
            Some(Wallet::ShortTerm) => totals.sth = total,
            None => return Err(invalid_wallet(&code)),
        }
    }

    Ok(totals)
}

pub async fn address_count<'e, E>(executor: E) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count = sqlx::query("SELECT COUNT(*) FROM addresses")
        .fetch_one(executor)
        .await?
        .get::<i64, _>(0);

    Ok(count)
}

pub(crate) fn record_from_row(row: &SqliteRow) -> Result<AddressRecord, sqlx::Error> {
    let code: String = row.try_get("wallet")?;
    let wallet = Wallet::from_code(&code).ok_or_else(|| invalid_wallet(&code))?;

    Ok(AddressRecord {
        address: row.try_get("address")?,
        balance: row.try_get("balance")?,
        wallet,
    })
}

fn invalid_wallet(code: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("unknown wallet code {:?}", code).into())
}
