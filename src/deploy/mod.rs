//! Deploying many identical workers at once.
//!
//! [`deploy_workers`] fans a batch out into independent attempts, at most
//! `concurrency` of which talk to the API at the same time. An attempt that
//! fails is reported and left out of the results; it never stops the rest of
//! the batch.

mod config;
mod progress;

pub use config::DeploymentConfig;
pub use progress::DeployProgress;

use std::error::Error;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::api::WorkersApi;
use crate::results::WorkerRecord;
use crate::settings::DEFAULT_DEPLOY_CONCURRENCY;
use crate::worker::WorkerType;

/// One batch of deployments.
#[derive(Clone, Debug)]
pub struct DeployRequest<'a> {
    pub count: usize,
    pub worker_type: WorkerType,
    pub script_content: &'a str,
    pub wasm_content: Option<&'a [u8]>,
    /// Maximum number of attempts in flight at once.
    pub concurrency: usize,
}

impl<'a> DeployRequest<'a> {
    pub fn new(count: usize, worker_type: WorkerType, script_content: &'a str) -> Self {
        DeployRequest {
            count,
            worker_type,
            script_content,
            wasm_content: None,
            concurrency: DEFAULT_DEPLOY_CONCURRENCY,
        }
    }
}

/// Permits for a gate over `jobs` attempts that allows `concurrency` at once.
///
/// A bound at or above `jobs` changes nothing, so it is cut down to `jobs`
/// and never past what a `Semaphore` can hold.
pub(crate) fn gate_size(concurrency: usize, jobs: usize) -> usize {
    concurrency.min(jobs).clamp(1, Semaphore::MAX_PERMITS)
}

struct AttemptFailure {
    name: Option<String>,
    cause: Box<dyn Error + Send + Sync>,
}

/// Runs `request.count` deployment attempts and returns a record for each
/// one that succeeded, in the order they finished.
///
/// Every attempt advances `progress` once. Failed attempts are reported to
/// `progress` as they happen. This only returns once every attempt has
/// settled.
pub async fn deploy_workers<A, P>(
    api: &A,
    request: &DeployRequest<'_>,
    progress: &P,
) -> Vec<WorkerRecord>
where
    A: WorkersApi + ?Sized,
    P: DeployProgress + ?Sized,
{
    if request.count == 0 {
        return Vec::new();
    }

    log::info!(
        "deploying {} {} workers, {} at a time",
        request.count,
        request.worker_type,
        request.concurrency
    );
    let gate = Semaphore::new(gate_size(request.concurrency, request.count));

    let mut attempts: FuturesUnordered<_> = (0..request.count)
        .map(|_| settle(api, request, &gate, progress))
        .collect();

    let mut records = Vec::with_capacity(request.count);
    while let Some(settled) = attempts.next().await {
        if let Some(record) = settled {
            records.push(record);
        }
    }

    log::info!("{} of {} workers deployed", records.len(), request.count);
    records
}

async fn settle<A, P>(
    api: &A,
    request: &DeployRequest<'_>,
    gate: &Semaphore,
    progress: &P,
) -> Option<WorkerRecord>
where
    A: WorkersApi + ?Sized,
    P: DeployProgress + ?Sized,
{
    let record = match attempt(api, request, gate).await {
        Ok(record) => {
            log::info!("deployed {} to {}", record.name, record.url);
            Some(record)
        }
        Err(failure) => {
            log::error!(
                "failed to create worker {}: {}",
                failure.name.as_deref().unwrap_or("<unnamed>"),
                failure.cause
            );
            progress.report_failure(failure.name.as_deref(), &*failure.cause);
            None
        }
    };
    progress.advance();
    record
}

async fn attempt<A>(
    api: &A,
    request: &DeployRequest<'_>,
    gate: &Semaphore,
) -> Result<WorkerRecord, AttemptFailure>
where
    A: WorkersApi + ?Sized,
{
    // Held until the attempt settles, covering every remote call it makes.
    let _permit = gate.acquire().await.map_err(|e| AttemptFailure {
        name: None,
        cause: Box::new(e),
    })?;

    let name = api
        .generate_worker_name()
        .await
        .map_err(|e| AttemptFailure {
            name: None,
            cause: Box::new(e),
        })?;

    let config = DeploymentConfig {
        name,
        script_content: request.script_content,
        worker_type: request.worker_type,
        wasm_content: request.wasm_content,
    };

    match api.deploy_worker(&config).await {
        Ok(url) => Ok(WorkerRecord::new(config.name, url, request.worker_type)),
        Err(e) => Err(AttemptFailure {
            name: Some(config.name),
            cause: Box::new(e),
        }),
    }
}
