use std::path::PathBuf;

use super::{block_on, Cli};
use crate::api::CloudflareClient;
use crate::commands::{self, CreateOptions};
use crate::settings::{validate_concurrency, Settings};
use crate::worker::WorkerType;

use anyhow::Result;

pub fn create(
    count: usize,
    worker_type: Option<String>,
    concurrency: Option<u64>,
    result: PathBuf,
    cli_params: &Cli,
) -> Result<()> {
    let settings = Settings::new(cli_params.config.as_deref())?;

    // Flags win over settings, and are held to the same rules.
    let worker_type = match worker_type {
        Some(worker_type) => worker_type.parse::<WorkerType>()?,
        None => settings.worker_type,
    };
    let concurrency = match concurrency {
        Some(concurrency) => validate_concurrency(concurrency)?,
        None => settings.concurrency,
    };

    let client = CloudflareClient::new(&settings)?;
    let options = CreateOptions {
        count,
        worker_type,
        concurrency,
        output: result,
    };

    block_on(commands::create::run(&client, &client, &options))?;
    Ok(())
}
