pub mod postgres;

use chrono::NaiveDateTime;
use std::future::Future;
use thiserror::Error;

pub use postgres::PgBalanceSource;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// One balance observation as reported by the remote source, in wei.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBalance {
    pub block: i64,
    pub address: String,
    pub balance_wei: u128,
    pub timestamp: NaiveDateTime,
}

/// Anything that can serve balance observations for a half-open window `[begin, end)`.
///
/// An unservable window is an `Err`, never an empty result.
pub trait BalanceSource {
    fn fetch_window(
        &self,
        begin: NaiveDateTime,
        end: NaiveDateTime,
    ) -> impl Future<Output = Result<Vec<RawBalance>, SourceError>> + Send;
}
