use crate::checkpoint::CheckpointError;
use crate::source::SourceError;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Every way a batch run can stop short. None of them advance a checkpoint.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Connection failure: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Fetch failed for window {begin} .. {end}: {source}")]
    Fetch {
        begin: NaiveDateTime,
        end: NaiveDateTime,
        #[source]
        source: SourceError,
    },

    #[error("Snapshot partition missing for {0}")]
    PartitionMissing(NaiveDate),

    #[error("Snapshot partition corrupt for {day}: {source}")]
    PartitionCorrupt {
        day: NaiveDate,
        #[source]
        source: sqlx::Error,
    },

    #[error("Write failed: {0}")]
    Write(#[from] sqlx::Error),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Balance out of range: {0}")]
    BalanceOutOfRange(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

impl PipelineError {
    /// Failures that leave the run resumable by simply invoking the job again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Fetch { .. } | PipelineError::Write(_) | PipelineError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_render_failure_is_an_error() {
        let failure = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = PipelineError::from(failure);

        assert!(matches!(err, PipelineError::Render(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_failures() {
        assert!(PipelineError::Io(std::io::Error::other("disk")).is_retryable());
        assert!(!PipelineError::Config("bad".into()).is_retryable());
        assert!(!PipelineError::PartitionMissing(NaiveDate::MIN).is_retryable());
    }
}
