use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::worker::WorkerType;

pub const DEFAULT_RESULT_PATH: &str = "proxyflare-workers.json";

/// One successfully deployed worker.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct WorkerRecord {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub worker_type: WorkerType,
    /// Seconds since the Unix epoch.
    pub created_at: f64,
}

impl WorkerRecord {
    /// A record for a worker deployed just now.
    pub fn new(name: String, url: String, worker_type: WorkerType) -> Self {
        let now = Utc::now();
        WorkerRecord {
            name,
            url,
            worker_type,
            created_at: now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9,
        }
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let secs = self.created_at.trunc() as i64;
        let nanos = (self.created_at.fract() * 1e9) as u32;
        Utc.timestamp_opt(secs, nanos).single()
    }
}

/// The JSON document written by `proxyflare create`: an array of records in
/// the order their deployments finished.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct WorkerResultFile(Vec<WorkerRecord>);

#[derive(Debug, Error)]
pub enum ResultFileError {
    #[error("No result file found at {}. Run `proxyflare create` first.", .0.display())]
    NotFound(PathBuf),
    #[error("Could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a valid result file: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl WorkerResultFile {
    pub fn new(records: Vec<WorkerRecord>) -> Self {
        WorkerResultFile(records)
    }

    pub fn load(path: &Path) -> Result<Self, ResultFileError> {
        log::info!("Reading worker results from {}", path.display());
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ResultFileError::NotFound(path.to_path_buf())
            } else {
                ResultFileError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        serde_json::from_str(&contents).map_err(|source| ResultFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ResultFileError> {
        log::info!("Writing {} worker results to {}", self.len(), path.display());
        let mut json = serde_json::to_string_pretty(self).map_err(|source| ResultFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        json.push('\n');
        fs::write(path, json).map_err(|source| ResultFileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn records(&self) -> &[WorkerRecord] {
        &self.0
    }

    pub fn into_records(self) -> Vec<WorkerRecord> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops the records whose names are in `names`, keeping the order of
    /// the rest.
    pub fn remove_named(&mut self, names: &HashSet<String>) {
        self.0.retain(|record| !names.contains(&record.name));
    }
}

impl From<Vec<WorkerRecord>> for WorkerResultFile {
    fn from(records: Vec<WorkerRecord>) -> Self {
        WorkerResultFile::new(records)
    }
}

impl<'a> IntoIterator for &'a WorkerResultFile {
    type Item = &'a WorkerRecord;
    type IntoIter = std::slice::Iter<'a, WorkerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
