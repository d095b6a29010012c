use holder_ledger::{
    config::Config,
    source::{BalanceSource, PgBalanceSource},
    units::wei_to_szabo,
};
use chrono::{Duration, NaiveDateTime};
use tracing::{info, Level};

// Fetches one window from the balance source and prints what would be cached.
// usage: check_source [YYYY-MM-DDTHH:MM:SS]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = Config::from_env();
    let begin = match std::env::args().nth(1) {
        Some(arg) => NaiveDateTime::parse_from_str(&arg, "%Y-%m-%dT%H:%M:%S")?,
        None => config.genesis_instant(),
    };
    let end = begin + Duration::seconds(config.fetch_window.as_secs() as i64);

    info!("Connecting to balance source...");
    let source = PgBalanceSource::connect(&config).await?;
    info!("✅ Connected");

    let rows = source.fetch_window(begin, end).await?;
    info!("✅ {} records retrieved for {} .. {}", rows.len(), begin, end);

    for row in rows.iter().take(10) {
        println!(
            "{} {} {} szabo {}",
            row.block,
            row.address,
            wei_to_szabo(row.balance_wei)?,
            row.timestamp
        );
    }

    source.close().await;
    Ok(())
}
