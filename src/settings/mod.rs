mod api_token;
mod number;

pub use api_token::ApiToken;

use std::convert::TryFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::CommandError;
use crate::worker::WorkerType;

use number::string_or_number;

pub const DEFAULT_CONFIG_PATH: &str = "proxyflare.toml";
pub const ENV_PREFIX: &str = "PROXYFLARE";

pub const DEFAULT_DEPLOY_CONCURRENCY: usize = 5;
pub const DEFAULT_WORKER_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_WORKER_PREFIX: &str = "proxyflare";
pub const DEFAULT_WORKERS_DIR: &str = "workers";

/// Everything `proxyflare` needs to know about the account it manages.
#[derive(Clone, Debug)]
pub struct Settings {
    pub account_id: String,
    pub api_token: ApiToken,
    /// Worker type used when a command doesn't name one.
    pub worker_type: WorkerType,
    /// Prefix of every worker name this tool creates.
    pub worker_prefix: String,
    /// Upper bound on concurrent remote calls during a batch.
    pub concurrency: usize,
    /// Directory holding the prebuilt worker artifacts, one subdirectory per type.
    pub workers_dir: PathBuf,
    /// Timeout for requests sent through a deployed worker.
    pub worker_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    account_id: Option<String>,
    api_token: Option<ApiToken>,
    worker_type: String,
    worker_prefix: String,
    #[serde(deserialize_with = "string_or_number")]
    concurrency: u64,
    workers_dir: PathBuf,
    #[serde(deserialize_with = "string_or_number")]
    worker_timeout: u64,
}

impl Settings {
    /// Loads settings from defaults, then the config file, then `PROXYFLARE_*`
    /// environment variables.
    ///
    /// Without an explicit `config_path`, `./proxyflare.toml` is read if it
    /// exists.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CommandError> {
        Settings::from_config(layered(config_path)?)
    }

    /// Only the timeout for proxied requests. Sending requests through
    /// deployed workers needs no account credentials, so none are required.
    pub fn worker_timeout(config_path: Option<&Path>) -> Result<Duration, CommandError> {
        worker_timeout_from_config(layered(config_path)?)
    }

    fn from_config(s: Config) -> Result<Self, CommandError> {
        let raw: RawSettings = s.try_into().map_err(config_error)?;
        log::debug!("Raw settings: {:?}", raw);

        let account_id = match raw.account_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => return Err(missing_setting("account_id")),
        };
        let api_token = match raw.api_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(missing_setting("api_token")),
        };
        let worker_type = raw.worker_type.parse::<WorkerType>()?;
        let concurrency = validate_concurrency(raw.concurrency)?;

        if raw.worker_prefix.trim().is_empty() {
            return Err(CommandError::Config(
                "worker_prefix must not be empty".to_string(),
            ));
        }

        Ok(Settings {
            account_id,
            api_token,
            worker_type,
            worker_prefix: raw.worker_prefix,
            concurrency,
            workers_dir: raw.workers_dir,
            worker_timeout: Duration::from_secs(raw.worker_timeout),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawTimeout {
    #[serde(deserialize_with = "string_or_number")]
    worker_timeout: u64,
}

fn worker_timeout_from_config(s: Config) -> Result<Duration, CommandError> {
    let raw: RawTimeout = s.try_into().map_err(config_error)?;
    Ok(Duration::from_secs(raw.worker_timeout))
}

fn layered(config_path: Option<&Path>) -> Result<Config, CommandError> {
    let mut s = Config::new();
    set_defaults(&mut s).map_err(config_error)?;

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    log::info!("Using config file: {} (required: {})", path.display(), required);
    s.merge(File::from(path).required(required))
        .map_err(config_error)?;

    // Eg.. `PROXYFLARE_ACCOUNT_ID=abc` would set the `account_id` key
    s.merge(Environment::with_prefix(ENV_PREFIX))
        .map_err(config_error)?;
    Ok(s)
}

/// Checks a concurrency bound, whether it came from settings or a flag.
pub fn validate_concurrency(concurrency: u64) -> Result<usize, CommandError> {
    match usize::try_from(concurrency) {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(CommandError::Config(format!(
            "concurrency must be at least 1, got {}",
            concurrency
        ))),
    }
}

fn set_defaults(s: &mut Config) -> Result<(), ConfigError> {
    s.set_default("worker_type", WorkerType::default().as_str())?;
    s.set_default("worker_prefix", DEFAULT_WORKER_PREFIX)?;
    s.set_default("concurrency", DEFAULT_DEPLOY_CONCURRENCY as i64)?;
    s.set_default("workers_dir", DEFAULT_WORKERS_DIR)?;
    s.set_default("worker_timeout", DEFAULT_WORKER_TIMEOUT_SECONDS as i64)?;
    Ok(())
}

fn config_error(e: ConfigError) -> CommandError {
    CommandError::Config(format!("Your configuration has an error: {}", e))
}

fn missing_setting(key: &str) -> CommandError {
    CommandError::Config(format!(
        "`{key}` is not set. Add it to {file} or set {prefix}_{env}.",
        key = key,
        file = DEFAULT_CONFIG_PATH,
        prefix = ENV_PREFIX,
        env = key.to_uppercase()
    ))
}
