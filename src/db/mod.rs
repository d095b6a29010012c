pub mod changelog;
pub mod connection;
pub mod history;
pub mod ledger;
pub mod report;

pub const INIT_SCHEMA: &str = r#"
-- One change log entry per address per day, holding the day's last balance
CREATE TABLE IF NOT EXISTS logs (
    address TEXT NOT NULL,
    balance INTEGER NOT NULL,
    day TEXT NOT NULL
);

-- Serves both per-address and per-(address, day) lookups
CREATE UNIQUE INDEX IF NOT EXISTS idx_logs_address_day ON logs(address, day);

-- Current balance and holder classification of every tracked address
CREATE TABLE IF NOT EXISTS addresses (
    address TEXT PRIMARY KEY,
    balance INTEGER NOT NULL,
    wallet TEXT NOT NULL DEFAULT 'S' CHECK (wallet IN ('L', 'S'))
);

CREATE INDEX IF NOT EXISTS idx_addresses_wallet ON addresses(wallet);

-- Daily LTH/STH totals in ether
CREATE TABLE IF NOT EXISTS history (
    day TEXT PRIMARY KEY,
    lth REAL NOT NULL,
    sth REAL NOT NULL
);
"#;
