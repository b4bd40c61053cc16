use std::path::Path;

use crate::commands;

use anyhow::Result;

/// Only reads the result file, so no settings are needed.
pub fn list(result: &Path) -> Result<()> {
    commands::list::run(result)?;
    Ok(())
}
