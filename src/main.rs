#![cfg_attr(feature = "strict", deny(warnings))]

use proxyflare::cli::{self, Cli};

use structopt::StructOpt;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    cli::run(Cli::from_args())
}
