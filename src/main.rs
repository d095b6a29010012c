// holder-ledger <command>
//   ingest    cache remote balance windows into day partitions
//   classify  merge partitions and classify addresses day by day
//   report    print the latest totals and the largest addresses

use holder_ledger::{
    config::Config,
    db::{connection, report},
    error::PipelineError,
    pipeline::{run_classification, run_ingestion},
    source::PgBalanceSource,
    state::{checkpoint_store, AppState},
    snapshot::PartitionStore,
};

use chrono::Utc;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: holder-ledger <ingest|classify|report [N]>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        return Err(USAGE.into());
    };

    let config = Config::from_env();
    config.validate()?;
    tracing::debug!("Configuration loaded: {:?}", config);

    // Stop between units of work on Ctrl+C
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Stop requested, finishing the current unit of work");
            signal_token.cancel();
        }
    });

    let today = Utc::now().date_naive();

    let result = match command.as_str() {
        "ingest" => ingest(config, today, &shutdown).await,
        "classify" => classify(config, today, &shutdown).await,
        "report" => {
            let top = args.get(1).and_then(|n| n.parse().ok()).unwrap_or(10);
            print_report(&config, top).await
        }
        other => {
            return Err(format!("unknown command {:?}\n{}", other, USAGE).into());
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        if e.is_retryable() {
            info!("Re-run the same command to resume from the last checkpoint");
        }
        return Err(e.into());
    }

    info!("Bye");
    Ok(())
}

async fn ingest(
    config: Config,
    today: chrono::NaiveDate,
    shutdown: &CancellationToken,
) -> Result<(), PipelineError> {
    let source = PgBalanceSource::connect(&config).await?;
    let partitions = PartitionStore::new(&config.partition_dir);
    let checkpoints = checkpoint_store(&config);

    let summary = run_ingestion(
        &source,
        &partitions,
        &checkpoints,
        config.fetch_window,
        today,
        shutdown,
    )
    .await;
    source.close().await;

    let summary = summary?;
    info!("All data cached until {}", summary.cursor);
    Ok(())
}

async fn classify(
    config: Config,
    today: chrono::NaiveDate,
    shutdown: &CancellationToken,
) -> Result<(), PipelineError> {
    let state = AppState::connect(config).await?;
    let summary = run_classification(&state, today, shutdown).await;
    state.db_pool.close().await;

    let summary = summary?;
    info!("Next day to classify: {}", summary.next_day);
    Ok(())
}

async fn print_report(config: &Config, top: i64) -> Result<(), PipelineError> {
    let pool = connection::establish_connection(&config.database_url)
        .await
        .map_err(PipelineError::Connection)?;

    let (latest, totals, addresses) = report::ledger_summary(&pool, top).await?;
    let address_count = report::address_count(&pool).await?;
    pool.close().await;

    let body = json!({
        "latest": latest,
        "totals_szabo": totals,
        "address_count": address_count,
        "top_addresses": addresses,
    });

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
