use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;

use crate::api::{ApiError, WorkersApi};
use crate::deploy::gate_size;
use crate::error::CommandError;
use crate::results::{ResultFileError, WorkerResultFile};
use crate::terminal::message::{Message, StdErr, StdOut};
use crate::terminal::{emoji, interactive, styles};

/// Which workers `proxyflare delete` removes.
#[derive(Clone, Debug, PartialEq)]
pub enum DeleteTarget {
    /// The workers recorded in the result file.
    ResultFile,
    /// Every script on the account that carries the worker prefix.
    AllWithPrefix,
}

#[derive(Clone, Debug)]
pub struct DeleteOptions {
    pub target: DeleteTarget,
    pub result_path: PathBuf,
    pub concurrency: usize,
    /// Skip the confirmation prompt.
    pub force: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct DeleteSummary {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

pub async fn run<A>(api: &A, options: &DeleteOptions) -> Result<DeleteSummary, CommandError>
where
    A: WorkersApi + ?Sized,
{
    let names: Vec<String> = match options.target {
        DeleteTarget::ResultFile => WorkerResultFile::load(&options.result_path)
            .map_err(|e| CommandError::Worker(e.to_string()))?
            .into_records()
            .into_iter()
            .map(|record| record.name)
            .collect(),
        DeleteTarget::AllWithPrefix => {
            StdOut::working("Looking up workers on your account...");
            api.list_workers()
                .await
                .map_err(|e| CommandError::Worker(e.to_string()))?
        }
    };

    if names.is_empty() {
        StdOut::info("There are no workers to delete.");
        return Ok(DeleteSummary::default());
    }

    if !options.force {
        match interactive::confirm(&format!(
            "Are you sure you want to permanently delete {} workers?",
            names.len()
        )) {
            Ok(true) => (),
            Ok(false) => {
                StdOut::info("Not deleting any workers.");
                return Ok(DeleteSummary::default());
            }
            Err(e) => return Err(CommandError::Config(e.to_string())),
        }
    }

    let bar = progress_bar(names.len());
    let summary = delete_workers(api, &names, options.concurrency, &bar).await;
    bar.finish_and_clear();

    prune_result_file(&options.result_path, &summary.deleted)?;

    StdOut::message(&format!(
        "{}Deleted {} of {} workers.",
        emoji::WASTEBASKET,
        summary.deleted.len(),
        names.len()
    ));
    if !summary.failed.is_empty() {
        StdErr::warn(&format!(
            "{} workers could not be deleted: {}",
            summary.failed.len(),
            summary.failed.join(", ")
        ));
    }
    Ok(summary)
}

/// Deletes `names`, at most `concurrency` at a time. A failed deletion is
/// reported and doesn't stop the others.
pub async fn delete_workers<A>(
    api: &A,
    names: &[String],
    concurrency: usize,
    bar: &ProgressBar,
) -> DeleteSummary
where
    A: WorkersApi + ?Sized,
{
    let gate = Semaphore::new(gate_size(concurrency, names.len()));
    let mut deletions: FuturesUnordered<_> = names
        .iter()
        .map(|name| delete_one(api, name, &gate))
        .collect();

    let mut summary = DeleteSummary::default();
    while let Some((name, outcome)) = deletions.next().await {
        match outcome {
            Ok(()) => summary.deleted.push(name.to_string()),
            Err(e) => {
                log::error!("failed to delete worker {}: {}", name, e);
                bar.println(format!(
                    "{} {} Failed to delete worker {}: {}",
                    emoji::WARN,
                    styles::warning("Error:"),
                    styles::bold(name),
                    e
                ));
                summary.failed.push(name.to_string());
            }
        }
        bar.inc(1);
    }
    summary
}

async fn delete_one<'a, A>(
    api: &A,
    name: &'a str,
    gate: &Semaphore,
) -> (&'a str, Result<(), ApiError>)
where
    A: WorkersApi + ?Sized,
{
    let outcome = match gate.acquire().await {
        Ok(_permit) => api.delete_worker(name).await,
        Err(e) => Err(ApiError::Decode(e.to_string())),
    };
    (name, outcome)
}

/// Drops deleted workers from the result file, removing the file once
/// nothing is left in it. A missing file is left alone.
fn prune_result_file(path: &Path, deleted: &[String]) -> Result<(), CommandError> {
    let mut results = match WorkerResultFile::load(path) {
        Ok(results) => results,
        Err(ResultFileError::NotFound(_)) => return Ok(()),
        Err(e) => return Err(CommandError::Worker(e.to_string())),
    };

    let deleted: HashSet<String> = deleted.iter().cloned().collect();
    results.remove_named(&deleted);

    if results.is_empty() {
        log::info!("every recorded worker is gone, removing {}", path.display());
        fs::remove_file(path).map_err(|e| {
            CommandError::Worker(format!("Could not remove {}: {}", path.display(), e))
        })
    } else {
        results
            .save(path)
            .map_err(|e| CommandError::Worker(e.to_string()))
    }
}

fn progress_bar(count: usize) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("{spinner} {msg} [{bar:40}] {pos}/{len}")
        .progress_chars("=> ");
    let bar = ProgressBar::new(count as u64).with_style(style);
    bar.set_message(format!("Deleting {} workers...", count));
    bar
}
