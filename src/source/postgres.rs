use super::{BalanceSource, RawBalance, SourceError};
use crate::config::Config;
use crate::error::PipelineError;
use crate::validation::parse_wei;
use chrono::NaiveDateTime;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::num::NonZeroU32;
use tracing::{debug, info};

// Ordered so that a later observation of an address always overwrites an earlier one.
const WINDOW_QUERY: &str = r#"
SELECT block_number::BIGINT AS block_number,
       address::TEXT AS address,
       balance::TEXT AS balance,
       timestamp
FROM balance
WHERE timestamp >= $1 AND timestamp < $2
ORDER BY timestamp ASC, block_number ASC
"#;

/// Balance table of an archive node's PostgreSQL mirror.
pub struct PgBalanceSource {
    pool: PgPool,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl PgBalanceSource {
    pub async fn connect(config: &Config) -> Result<Self, PipelineError> {
        info!("Connecting to balance source");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.source_timeout)
            .connect(&config.source_database_url)
            .await
            .map_err(PipelineError::Connection)?;

        // Fail before any work if the source cannot answer at all
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(PipelineError::Connection)?;

        let limiter = config
            .fetch_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));

        if let Some(limit) = config.fetch_rate_limit {
            info!("Balance source rate limited to {} queries per second", limit);
        }

        Ok(Self { pool, limiter })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

impl BalanceSource for PgBalanceSource {
    async fn fetch_window(
        &self,
        begin: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<RawBalance>, SourceError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let rows = sqlx::query(WINDOW_QUERY)
            .bind(begin)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        let mut balances = Vec::with_capacity(rows.len());
        for row in &rows {
            let balance: String = row.try_get("balance")?;
            let balance_wei = parse_wei(&balance)
                .map_err(|e| SourceError::MalformedRow(e.to_string()))?;

            balances.push(RawBalance {
                block: row.try_get("block_number")?,
                address: row.try_get("address")?,
                balance_wei,
                timestamp: row.try_get("timestamp")?,
            });
        }

        debug!("Fetched {} balance rows for {} .. {}", balances.len(), begin, end);
        Ok(balances)
    }
}
