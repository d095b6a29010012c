//! Durable progress cursors for the two batch jobs.
//!
//! Each cursor lives in its own small text file holding an ISO-8601 value.
//! Writes go to a sibling temp file which is then renamed over the target, so
//! a crash leaves either the old or the new cursor on disk, never a torn one.

use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const INGESTION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Cannot access checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unparseable checkpoint {path}: {value:?}")]
    Parse { path: PathBuf, value: String },
}

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    ingestion_path: PathBuf,
    classification_path: PathBuf,
    genesis_instant: NaiveDateTime,
}

impl CheckpointStore {
    pub fn new(
        ingestion_path: impl Into<PathBuf>,
        classification_path: impl Into<PathBuf>,
        genesis_instant: NaiveDateTime,
    ) -> Self {
        Self {
            ingestion_path: ingestion_path.into(),
            classification_path: classification_path.into(),
            genesis_instant,
        }
    }

    /// Exclusive lower bound of the next fetch window.
    pub fn load_ingestion(&self) -> Result<NaiveDateTime, CheckpointError> {
        match read_trimmed(&self.ingestion_path)? {
            Some(value) => NaiveDateTime::parse_from_str(&value, INGESTION_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S"))
                .map_err(|_| CheckpointError::Parse {
                    path: self.ingestion_path.clone(),
                    value,
                }),
            None => {
                info!(
                    "No ingestion checkpoint at {}, starting from {}",
                    self.ingestion_path.display(),
                    self.genesis_instant
                );
                Ok(self.genesis_instant)
            }
        }
    }

    pub fn save_ingestion(&self, cursor: NaiveDateTime) -> Result<(), CheckpointError> {
        write_atomic(&self.ingestion_path, &cursor.format(INGESTION_FORMAT).to_string())?;
        debug!("Ingestion checkpoint saved: {}", cursor);
        Ok(())
    }

    /// Next day to classify, inclusive.
    pub fn load_classification(&self) -> Result<NaiveDate, CheckpointError> {
        match read_trimmed(&self.classification_path)? {
            Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
                CheckpointError::Parse {
                    path: self.classification_path.clone(),
                    value,
                }
            }),
            None => {
                let genesis = self.genesis_instant.date();
                info!(
                    "No classification checkpoint at {}, starting from {}",
                    self.classification_path.display(),
                    genesis
                );
                Ok(genesis)
            }
        }
    }

    pub fn save_classification(&self, next_day: NaiveDate) -> Result<(), CheckpointError> {
        write_atomic(&self.classification_path, &next_day.format("%Y-%m-%d").to_string())?;
        debug!("Classification checkpoint saved: {}", next_day);
        Ok(())
    }
}

/// Missing and empty files both mean "no checkpoint yet".
fn read_trimmed(path: &Path) -> Result<Option<String>, CheckpointError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let trimmed = contents.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_atomic(path: &Path, value: &str) -> Result<(), CheckpointError> {
    let io_err = |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, value).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 7, 30)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn store(dir: &Path) -> CheckpointStore {
        CheckpointStore::new(dir.join("status.cache"), dir.join("status.calc"), genesis())
    }

    #[test]
    fn test_missing_checkpoints_default_to_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert_eq!(store.load_ingestion().unwrap(), genesis());
        assert_eq!(
            store.load_classification().unwrap(),
            NaiveDate::from_ymd_opt(2015, 7, 30).unwrap()
        );
    }

    #[test]
    fn test_empty_file_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::write(dir.path().join("status.calc"), "\n").unwrap();

        assert_eq!(store.load_classification().unwrap(), genesis().date());
    }

    #[test]
    fn test_saved_cursors_are_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let cursor = genesis() + chrono::Duration::seconds(300);
        store.save_ingestion(cursor).unwrap();
        store
            .save_classification(NaiveDate::from_ymd_opt(2016, 1, 2).unwrap())
            .unwrap();

        assert_eq!(store.load_ingestion().unwrap(), cursor);
        assert_eq!(
            store.load_classification().unwrap(),
            NaiveDate::from_ymd_opt(2016, 1, 2).unwrap()
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("status.cache")).unwrap(),
            "2015-07-30T15:05:00"
        );
        assert!(!dir.path().join("status.cache.tmp").exists());
    }

    #[test]
    fn test_garbled_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::write(dir.path().join("status.calc"), "yesterday").unwrap();

        assert!(matches!(
            store.load_classification(),
            Err(CheckpointError::Parse { .. })
        ));
    }
}
