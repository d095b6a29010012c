// Rows of the snapshot partitions, the change log, the address ledger and the history series.
// Balances are szabo (`units::SZABO`) unless a field says otherwise.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Latest known balance of an address inside one day partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BalanceSnapshot {
    pub block: i64,
    pub address: String,
    pub balance: i64,
    pub observed_at: NaiveDateTime,
}

/// A balance-affecting event: the last balance an address held on `day`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChangeLogEntry {
    pub address: String,
    pub balance: i64,
    pub day: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wallet {
    #[serde(rename = "LTH")]
    LongTerm,
    #[serde(rename = "STH")]
    ShortTerm,
}

impl Wallet {
    /// Single-letter code persisted in the `wallet` column.
    pub fn code(self) -> &'static str {
        match self {
            Wallet::LongTerm => "L",
            Wallet::ShortTerm => "S",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "L" => Some(Wallet::LongTerm),
            "S" => Some(Wallet::ShortTerm),
            _ => None,
        }
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wallet::LongTerm => write!(f, "LTH"),
            Wallet::ShortTerm => write!(f, "STH"),
        }
    }
}

/// Current state of one tracked address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: String,
    pub balance: i64,
    pub wallet: Wallet,
}

/// Daily LTH/STH totals, in ether.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HistoryPoint {
    pub day: NaiveDate,
    pub lth_total: f64,
    pub sth_total: f64,
}

/// Ledger balances summed per wallet, in szabo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTotals {
    pub lth: i64,
    pub sth: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_code_round_trip() {
        for wallet in [Wallet::LongTerm, Wallet::ShortTerm] {
            assert_eq!(Wallet::from_code(wallet.code()), Some(wallet));
        }
        assert_eq!(Wallet::from_code("X"), None);
        assert_eq!(serde_json::to_string(&Wallet::LongTerm).unwrap(), "\"LTH\"");
    }
}
