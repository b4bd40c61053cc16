use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::WorkerType;

/// The prebuilt artifacts uploaded for one worker type.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerSource {
    pub script: String,
    pub wasm: Option<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Worker source not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads the artifacts for `worker_type` from `<workers_dir>/<type>/`.
///
/// Building these artifacts is done ahead of time by the per-language
/// toolchains; this only checks they are there.
pub fn load_source(workers_dir: &Path, worker_type: WorkerType) -> Result<WorkerSource, SourceError> {
    let meta = worker_type.meta();
    let type_dir = workers_dir.join(worker_type.as_str());

    let script_path = type_dir.join(meta.source_file);
    log::info!("Loading {} worker source from {}", worker_type, script_path.display());
    let script = fs::read_to_string(&script_path).map_err(|e| read_error(script_path, e))?;

    let wasm = match meta.wasm_file {
        Some(wasm_file) => {
            let wasm_path = type_dir.join(wasm_file);
            log::info!("Loading wasm module from {}", wasm_path.display());
            Some(fs::read(&wasm_path).map_err(|e| read_error(wasm_path, e))?)
        }
        None => None,
    };

    Ok(WorkerSource { script, wasm })
}

fn read_error(path: PathBuf, source: io::Error) -> SourceError {
    if source.kind() == io::ErrorKind::NotFound {
        SourceError::NotFound(path)
    } else {
        SourceError::Read { path, source }
    }
}
