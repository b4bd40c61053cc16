use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{ApiError, TokenApi, WorkersApi};
use crate::commands::verify::check_token;
use crate::deploy::{deploy_workers, DeployRequest};
use crate::error::CommandError;
use crate::results::{WorkerRecord, WorkerResultFile};
use crate::terminal::message::{Message, StdOut};
use crate::terminal::{emoji, styles};
use crate::worker::{SourceError, WorkerType};

const CREDENTIALS_HINT: &str =
    "Could not complete deployment. Check your API token and account settings.";

#[derive(Clone, Debug)]
pub struct CreateOptions {
    pub count: usize,
    pub worker_type: WorkerType,
    pub concurrency: usize,
    /// Where the records of the new workers are written.
    pub output: PathBuf,
}

/// Deploys `options.count` workers and writes the ones that came up to
/// `options.output`.
///
/// Everything the whole batch depends on (the worker artifacts, the token,
/// the workers.dev subdomain) is checked first; a problem with any of them
/// stops the command before a single worker is deployed. Once the batch is
/// running, individual failures are only reported.
pub async fn run<A, T>(
    workers: &A,
    tokens: &T,
    options: &CreateOptions,
) -> Result<Vec<WorkerRecord>, CommandError>
where
    A: WorkersApi + ?Sized,
    T: TokenApi + ?Sized,
{
    let source = workers
        .get_worker_source(options.worker_type)
        .map_err(source_error)?;

    StdOut::working("Verifying your API token...");
    check_token(tokens).await?;

    let spinner = spinner("Checking subdomain...");
    let subdomain = workers.ensure_subdomain().await;
    spinner.finish_and_clear();
    let subdomain = subdomain.map_err(deployment_error)?;
    StdOut::message(&format!(
        "{}Using subdomain: {}",
        emoji::CHECK,
        styles::bold(format!("{}.workers.dev", subdomain))
    ));

    let request = DeployRequest {
        wasm_content: source.wasm.as_deref(),
        concurrency: options.concurrency,
        ..DeployRequest::new(options.count, options.worker_type, &source.script)
    };

    let bar = progress_bar(options.count);
    let records = deploy_workers(workers, &request, &bar).await;
    bar.finish_and_clear();

    if records.is_empty() {
        StdOut::warn("No workers were created.");
        return Ok(records);
    }

    WorkerResultFile::new(records.clone())
        .save(&options.output)
        .map_err(|e| CommandError::Worker(e.to_string()))?;

    StdOut::success(&format!(
        "Successfully created {} of {} workers!",
        records.len(),
        options.count
    ));
    StdOut::info(&format!(
        "Results saved to: {}",
        styles::bold(options.output.display())
    ));
    Ok(records)
}

fn source_error(e: SourceError) -> CommandError {
    match &e {
        SourceError::NotFound(_) => CommandError::Worker(e.to_string()),
        SourceError::Read { .. } => CommandError::Worker(format!(
            "Failed to load worker source: {}\nHint: the worker artifacts must be built before they can be deployed (for rust workers, build the wasm module first).",
            e
        )),
    }
}

fn deployment_error(e: ApiError) -> CommandError {
    log::error!("subdomain check failed: {}", e);
    if e.is_auth_error() {
        CommandError::Worker(CREDENTIALS_HINT.to_string())
    } else {
        CommandError::Worker(e.to_string())
    }
}

fn spinner(msg: &'static str) -> ProgressBar {
    let style = ProgressStyle::default_spinner().template("{spinner}   {msg}");
    let spinner = ProgressBar::new_spinner().with_style(style);
    spinner.enable_steady_tick(20);
    spinner.set_message(msg);
    spinner
}

fn progress_bar(count: usize) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("{spinner} {msg} [{bar:40}] {pos}/{len}")
        .progress_chars("=> ");
    let bar = ProgressBar::new(count as u64).with_style(style);
    bar.set_message(format!("Creating {} workers...", count));
    bar
}
