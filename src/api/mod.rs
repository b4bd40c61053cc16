//! The boundary between `proxyflare` and the Cloudflare API.
//!
//! Commands and the deployment orchestrator only ever see the [`WorkersApi`]
//! and [`TokenApi`] traits. [`CloudflareClient`] implements both against the
//! real API; unit tests use the fakes in `fake`.

mod cloudflare;
mod error;
mod form;

#[cfg(test)]
pub(crate) mod fake;

pub use cloudflare::CloudflareClient;
pub use error::{ApiError, ApiErrorDetail};

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;

use crate::deploy::DeploymentConfig;
use crate::worker::{SourceError, WorkerSource, WorkerType};

/// Operations for creating and managing worker scripts on an account.
#[async_trait]
pub trait WorkersApi: Send + Sync {
    /// A fresh script name. Expected to be unique per call.
    async fn generate_worker_name(&self) -> Result<String, ApiError>;

    /// The account's workers.dev subdomain, registering one if needed.
    /// Idempotent.
    async fn ensure_subdomain(&self) -> Result<String, ApiError>;

    /// The artifacts to upload for `worker_type`.
    fn get_worker_source(&self, worker_type: WorkerType) -> Result<WorkerSource, SourceError>;

    /// Uploads a worker, exposes it on workers.dev and returns its URL.
    async fn deploy_worker(&self, config: &DeploymentConfig<'_>) -> Result<String, ApiError>;

    /// Names of the account's scripts that this tool created.
    async fn list_workers(&self) -> Result<Vec<String>, ApiError>;

    async fn delete_worker(&self, name: &str) -> Result<(), ApiError>;
}

/// Inspection of the API token the client authenticates with.
#[async_trait]
pub trait TokenApi: Send + Sync {
    /// Returns `None` when the API answers without a verification result.
    async fn verify(&self) -> Result<Option<TokenVerification>, ApiError>;

    async fn get(&self, token_id: &str) -> Result<TokenDetails, ApiError>;
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TokenVerification {
    pub id: String,
    pub status: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TokenDetails {
    pub id: String,
    #[serde(default)]
    pub policies: Vec<Policy>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Policy {
    pub effect: String,
    #[serde(default)]
    pub permission_groups: Vec<PermissionGroup>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PermissionGroup {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

const NAME_SUFFIX_LEN: usize = 8;
const NAME_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// `<prefix>-<8 random lowercase alphanumerics>`, which is always a valid
/// script name and DNS label for a reasonable prefix.
pub fn worker_name(prefix: &str) -> String {
    format!("{}-{}", prefix, random_suffix(NAME_SUFFIX_LEN))
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| NAME_CHARSET[rng.gen_range(0..NAME_CHARSET.len())] as char)
        .collect()
}
