pub mod create;
pub mod delete;
pub mod fetch;
pub mod list;
pub mod verify;

use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;
use url::Url;

use crate::error::CommandError;
use crate::terminal::emoji;

#[derive(Debug, Clone, StructOpt)]
#[structopt(
    name = "proxyflare",
    about = "Deploy and manage Cloudflare Workers that proxy HTTP requests",
    after_help = "Settings are read from ./proxyflare.toml and PROXYFLARE_* environment variables."
)]
pub struct Cli {
    /// Path to the configuration file [default: ./proxyflare.toml]
    #[structopt(short = "c", long, global = true, parse(from_os_str))]
    pub config: Option<PathBuf>,
    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, StructOpt)]
#[structopt(rename_all = "lower")]
pub enum Command {
    /// Deploy new proxy workers
    Create {
        /// Number of workers to create
        #[structopt(long, default_value = "1")]
        count: usize,
        /// Type of worker (python, rust, js or ts). Defaults to the configured type
        #[structopt(long = "type")]
        worker_type: Option<String>,
        /// Maximum number of workers deployed at the same time
        #[structopt(long)]
        concurrency: Option<u64>,
        /// Where to save the records of the created workers
        #[structopt(long, default_value = "proxyflare-workers.json", parse(from_os_str))]
        result: PathBuf,
    },
    /// Check that the API token is active and has the permissions proxyflare needs
    Verify,
    /// List the workers recorded in a result file
    List {
        /// Result file to read
        #[structopt(long, default_value = "proxyflare-workers.json", parse(from_os_str))]
        result: PathBuf,
    },
    /// Delete deployed workers
    Delete {
        /// Result file listing the workers to delete
        #[structopt(long, default_value = "proxyflare-workers.json", parse(from_os_str))]
        result: PathBuf,
        /// Delete every worker on the account whose name has the configured prefix
        #[structopt(long)]
        all: bool,
        /// Don't ask for confirmation
        #[structopt(short = "f", long)]
        force: bool,
        /// Maximum number of workers deleted at the same time
        #[structopt(long)]
        concurrency: Option<u64>,
    },
    /// Send a GET request through one of the deployed workers and print the response
    Fetch {
        /// URL to request
        #[structopt(index = 1)]
        url: Url,
        /// Result file listing the workers to choose from
        #[structopt(long, default_value = "proxyflare-workers.json", parse(from_os_str))]
        result: PathBuf,
    },
}

pub fn run(cli_params: Cli) -> Result<()> {
    log::debug!("{} running {:?}", emoji::WORKER, cli_params.command);
    match cli_params.command.clone() {
        Command::Create {
            count,
            worker_type,
            concurrency,
            result,
        } => create::create(count, worker_type, concurrency, result, &cli_params),
        Command::Verify => verify::verify(&cli_params),
        Command::List { result } => list::list(&result),
        Command::Delete {
            result,
            all,
            force,
            concurrency,
        } => delete::delete(result, all, force, concurrency, &cli_params),
        Command::Fetch { url, result } => fetch::fetch(url, result, &cli_params),
    }
}

/// Drives an async command to completion on a single-threaded runtime.
fn block_on<F, T>(command: F) -> Result<T>
where
    F: Future<Output = Result<T, CommandError>>,
{
    let value = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(command)?;
    Ok(value)
}
