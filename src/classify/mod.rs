pub mod engine;
pub mod sweep;

pub use engine::{ClassificationEngine, Verdict};
pub use sweep::{run_daily_sweep, SweepSummary};
