pub mod classification;
pub mod ingestion;
pub mod merge;

pub use classification::{run_classification, ClassificationSummary, DayStage};
pub use ingestion::{run_ingestion, IngestionSummary};
pub use merge::{merge_day, MergeSummary};

use std::fmt;

/// Why a batch run returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the requested end day.
    CaughtUp,
    /// The next day has not been fully ingested yet.
    WaitingForIngestion,
    /// A stop was requested; the last unit of work was committed first.
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::CaughtUp => write!(f, "caught up"),
            StopReason::WaitingForIngestion => write!(f, "waiting for ingestion"),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}
