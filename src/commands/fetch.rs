use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::error::CommandError;
use crate::proxy::ProxyPool;
use crate::results::WorkerResultFile;
use crate::terminal::emoji;
use crate::terminal::message::{Message, StdErr};

/// GETs `target` through one of the workers in `result_path` and prints the
/// response body to stdout.
pub async fn run(result_path: &Path, target: &Url, timeout: Duration) -> Result<(), CommandError> {
    let results =
        WorkerResultFile::load(result_path).map_err(|e| CommandError::Worker(e.to_string()))?;
    let pool = ProxyPool::new(&results, timeout).map_err(|e| CommandError::Worker(e.to_string()))?;

    let response = pool
        .fetch(target)
        .await
        .map_err(|e| CommandError::Worker(e.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CommandError::Worker(e.to_string()))?;

    // Keep stdout for the body so it can be piped.
    StdErr::message(&format!("{}{} {}", emoji::GLOBE, status, target));
    println!("{}", body);

    if status.is_success() {
        Ok(())
    } else {
        Err(CommandError::Worker(format!(
            "{} answered with status {}",
            target, status
        )))
    }
}
