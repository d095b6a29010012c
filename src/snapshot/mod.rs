pub mod partition;

pub use partition::{PartitionStore, SnapshotPartition};

/// Schema of one day partition. `closures` remembers addresses whose last
/// snapshot of the day reported a zero balance.
pub const PARTITION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS balance (
    address TEXT PRIMARY KEY,
    block INTEGER NOT NULL,
    balance INTEGER NOT NULL,
    observed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS closures (
    address TEXT PRIMARY KEY,
    block INTEGER NOT NULL,
    observed_at TEXT NOT NULL
);
"#;
