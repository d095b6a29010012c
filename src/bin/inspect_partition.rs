use holder_ledger::{config::Config, snapshot::PartitionStore, units::szabo_to_ether};
use chrono::NaiveDate;

// Prints the size, total and largest balances of one day partition.
// usage: inspect_partition YYYY-MM-DD [N]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let day = match args.next() {
        Some(arg) => NaiveDate::parse_from_str(&arg, "%Y-%m-%d")?,
        None => {
            eprintln!("usage: inspect_partition YYYY-MM-DD [N]");
            return Ok(());
        }
    };
    let top: i64 = args.next().and_then(|n| n.parse().ok()).unwrap_or(10);

    let config = Config::from_env();
    let partitions = PartitionStore::new(&config.partition_dir);

    let partition = partitions.open_existing(day).await?;
    println!("Opened {}", partition.path().display());

    let positions = partition.read_all().await?;
    let closures = partition.read_closures().await?;
    let total = partition.total_balance().await?;
    println!(
        "{} open positions, {} closed, {:.6} ETH in total",
        positions.len(),
        closures.len(),
        szabo_to_ether(total)
    );

    let mut others = total;
    for snapshot in partition.top_balances(top).await? {
        println!("{:>24.6} ETH  {}", szabo_to_ether(snapshot.balance), snapshot.address);
        others -= snapshot.balance;
    }
    println!("{:>24.6} ETH  Others", szabo_to_ether(others));

    partition.close().await;
    Ok(())
}
