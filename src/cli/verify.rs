use super::{block_on, Cli};
use crate::api::CloudflareClient;
use crate::commands;
use crate::settings::Settings;

use anyhow::Result;

pub fn verify(cli_params: &Cli) -> Result<()> {
    let settings = Settings::new(cli_params.config.as_deref())?;
    let client = CloudflareClient::new(&settings)?;
    block_on(commands::verify::run(&client))
}
