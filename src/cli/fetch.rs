use std::path::PathBuf;

use super::{block_on, Cli};
use crate::commands;
use crate::settings::Settings;

use anyhow::Result;
use url::Url;

pub fn fetch(url: Url, result: PathBuf, cli_params: &Cli) -> Result<()> {
    let timeout = Settings::worker_timeout(cli_params.config.as_deref())?;
    block_on(commands::fetch::run(&result, &url, timeout))
}
