//! Scale factors between the three balance units.
//!
//! The remote source reports wei, snapshot partitions and the ledger keep
//! integer szabo, and the history series reports ether.

use crate::error::PipelineError;

/// Wei per szabo (1e12).
pub const WEI_PER_SZABO: u128 = 1_000_000_000_000;

/// Szabo per ether (1e6).
pub const SZABO_PER_ETHER: f64 = 1_000_000.0;

/// Converts a raw wei balance into szabo, truncating dust below one szabo.
pub fn wei_to_szabo(wei: u128) -> Result<i64, PipelineError> {
    i64::try_from(wei / WEI_PER_SZABO)
        .map_err(|_| PipelineError::BalanceOutOfRange(format!("{} wei", wei)))
}

pub fn szabo_to_ether(szabo: i64) -> f64 {
    szabo as f64 / SZABO_PER_ETHER
}
