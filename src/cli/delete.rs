use std::path::PathBuf;

use super::{block_on, Cli};
use crate::api::CloudflareClient;
use crate::commands::{self, DeleteOptions, DeleteTarget};
use crate::settings::{validate_concurrency, Settings};

use anyhow::Result;

pub fn delete(
    result: PathBuf,
    all: bool,
    force: bool,
    concurrency: Option<u64>,
    cli_params: &Cli,
) -> Result<()> {
    let settings = Settings::new(cli_params.config.as_deref())?;
    let concurrency = match concurrency {
        Some(concurrency) => validate_concurrency(concurrency)?,
        None => settings.concurrency,
    };
    let target = if all {
        DeleteTarget::AllWithPrefix
    } else {
        DeleteTarget::ResultFile
    };

    let client = CloudflareClient::new(&settings)?;
    let options = DeleteOptions {
        target,
        result_path: result,
        concurrency,
        force,
    };

    block_on(commands::delete::run(&client, &options))?;
    Ok(())
}
