//! Long-term / short-term holder rule.
//!
//! Two stages, evaluated in order:
//!
//! 1. **Inactivity.** No change log entry in `[day - (threshold + 1), day - 1]`
//!    means the address has not moved funds for longer than the threshold:
//!    long-term holder.
//! 2. **Weighted realized balance.** Over `[day - (window + 1), day - 1]` every
//!    entry gets the age weight `w = 1 - log_180(age)`. The previous balance
//!    level is `pbl = 2 * sqrt(sum(balance^2 * w)) / sum(w)`. A current balance
//!    at or below `pbl` is a long-term holder, anything above is short-term.
//!
//! When the Stage 2 window carries no positive weight the address is
//! short-term. That is a verdict of its own, distinct from a failed query,
//! which propagates as an error.

use crate::config::{ClassificationParams, WEIGHT_LOG_BASE};
use crate::db::changelog;
use crate::models::{ChangeLogEntry, Wallet};
use chrono::{Days, NaiveDate};
use sqlx::SqliteConnection;

/// Why an address ended up in its wallet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Stage 1: no balance change within the threshold.
    Inactive,
    /// Stage 2: current balance is at or below the realized level.
    WithinRealizedLevel { pbl: f64 },
    /// Stage 2: current balance exceeds the realized level.
    AboveRealizedLevel { pbl: f64 },
    /// Stage 2 window carried no positive weight.
    NoWeightedHistory,
}

impl Verdict {
    pub fn wallet(&self) -> Wallet {
        match self {
            Verdict::Inactive | Verdict::WithinRealizedLevel { .. } => Wallet::LongTerm,
            Verdict::AboveRealizedLevel { .. } | Verdict::NoWeightedHistory => Wallet::ShortTerm,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClassificationEngine {
    params: ClassificationParams,
}

impl ClassificationEngine {
    pub fn new(params: ClassificationParams) -> Self {
        Self { params }
    }

    /// Stage 1 lookback, inclusive on both ends.
    pub fn inactivity_window(&self, reference_day: NaiveDate) -> (NaiveDate, NaiveDate) {
        lookback(reference_day, self.params.threshold_days)
    }

    /// Stage 2 lookback, inclusive on both ends.
    pub fn weighted_window(&self, reference_day: NaiveDate) -> (NaiveDate, NaiveDate) {
        lookback(reference_day, self.params.window_size_days)
    }

    /// Loads the address's history once and evaluates both stages against it.
    pub async fn classify(
        &self,
        conn: &mut SqliteConnection,
        address: &str,
        reference_day: NaiveDate,
        current_balance: i64,
    ) -> Result<Verdict, sqlx::Error> {
        let (inactive_from, end) = self.inactivity_window(reference_day);
        let (weighted_from, _) = self.weighted_window(reference_day);

        let entries =
            changelog::entries_between(conn, address, inactive_from.min(weighted_from), end).await?;

        Ok(self.evaluate(&entries, reference_day, current_balance))
    }

    /// Pure form of [`classify`](Self::classify). Entries outside the windows are ignored.
    pub fn evaluate(
        &self,
        entries: &[ChangeLogEntry],
        reference_day: NaiveDate,
        current_balance: i64,
    ) -> Verdict {
        let (from, to) = self.inactivity_window(reference_day);
        if !entries.iter().any(|e| e.day >= from && e.day <= to) {
            return Verdict::Inactive;
        }

        let (from, to) = self.weighted_window(reference_day);
        let window = entries.iter().filter(|e| e.day >= from && e.day <= to);

        match realized_level(window, reference_day) {
            Some(pbl) if current_balance as f64 <= pbl => Verdict::WithinRealizedLevel { pbl },
            Some(pbl) => Verdict::AboveRealizedLevel { pbl },
            None => Verdict::NoWeightedHistory,
        }
    }
}

/// `[day - (days + 1), day - 1]`, saturating at the earliest representable date.
fn lookback(reference_day: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let end = reference_day.pred_opt().unwrap_or(NaiveDate::MIN);
    let start = end
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN);
    (start, end)
}

/// Decay weight for an entry `age_days` old. Ages below one count as one; weights never go negative.
pub fn age_weight(age_days: i64) -> f64 {
    let age = age_days.max(1) as f64;
    (1.0 - age.ln() / WEIGHT_LOG_BASE.ln()).max(0.0)
}

/// Weighted root-sum-of-squares estimate of the realized balance level,
/// or `None` when the entries carry no positive weight.
pub fn realized_level<'a, I>(entries: I, reference_day: NaiveDate) -> Option<f64>
where
    I: IntoIterator<Item = &'a ChangeLogEntry>,
{
    let mut weight_sum = 0.0;
    let mut weighted_squares = 0.0;

    for entry in entries {
        let weight = age_weight((reference_day - entry.day).num_days());
        let balance = entry.balance as f64;
        weight_sum += weight;
        weighted_squares += balance * balance * weight;
    }

    if weight_sum <= 0.0 {
        return None;
    }

    Some(2.0 * weighted_squares.sqrt() / weight_sum)
}
