//! In-memory stand-ins for the Cloudflare API, for unit tests.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{ApiError, TokenApi, TokenDetails, TokenVerification, WorkersApi};
use crate::deploy::DeploymentConfig;
use crate::worker::{SourceError, WorkerSource, WorkerType};

const DEPLOY_LATENCY: Duration = Duration::from_millis(5);
const REVERSE_LATENCY_BASE: u64 = 10;

/// What the fake saw for one deploy call.
#[derive(Clone, Debug, PartialEq)]
pub struct DeployedWorker {
    pub name: String,
    pub script: String,
    pub wasm_len: Option<usize>,
    pub worker_type: WorkerType,
}

/// Issues names `fake-0`, `fake-1`, ... and deploys them to
/// `https://fake-N.fake.workers.dev` after a short delay.
pub struct FakeWorkersApi {
    failing_attempts: HashSet<usize>,
    failing_names: usize,
    failing_subdomain: bool,
    missing_source: bool,
    reverse_latency: bool,
    failing_deletes: HashSet<String>,
    name_requests: AtomicUsize,
    names_issued: AtomicUsize,
    deploy_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    deployed: Mutex<Vec<DeployedWorker>>,
    remote: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeWorkersApi {
    pub fn new() -> Self {
        FakeWorkersApi {
            failing_attempts: HashSet::new(),
            failing_names: 0,
            failing_subdomain: false,
            missing_source: false,
            reverse_latency: false,
            failing_deletes: HashSet::new(),
            name_requests: AtomicUsize::new(0),
            names_issued: AtomicUsize::new(0),
            deploy_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            deployed: Mutex::new(Vec::new()),
            remote: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Deploying `fake-N` fails for every `N` in `indices`.
    pub fn failing_attempts(mut self, indices: &[usize]) -> Self {
        self.failing_attempts = indices.iter().copied().collect();
        self
    }

    /// The first `n` name requests fail.
    pub fn failing_names(mut self, n: usize) -> Self {
        self.failing_names = n;
        self
    }

    pub fn failing_subdomain(mut self) -> Self {
        self.failing_subdomain = true;
        self
    }

    pub fn missing_source(mut self) -> Self {
        self.missing_source = true;
        self
    }

    /// `fake-0` takes longest to deploy, `fake-1` a bit less, and so on.
    pub fn reverse_latency(mut self) -> Self {
        self.reverse_latency = true;
        self
    }

    /// Scripts that already exist on the account.
    pub fn with_remote_workers(self, names: &[&str]) -> Self {
        *self.remote.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn failing_deletes(mut self, names: &[&str]) -> Self {
        self.failing_deletes = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn names_issued(&self) -> usize {
        self.names_issued.load(Ordering::SeqCst)
    }

    pub fn deploy_calls(&self) -> usize {
        self.deploy_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn deployed(&self) -> Vec<DeployedWorker> {
        self.deployed.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn latency(&self, index: usize) -> Duration {
        if self.reverse_latency {
            Duration::from_millis(10 * REVERSE_LATENCY_BASE.saturating_sub(index as u64))
        } else {
            DEPLOY_LATENCY
        }
    }
}

fn index_of(name: &str) -> usize {
    name.trim_start_matches("fake-").parse().unwrap_or(usize::MAX)
}

#[async_trait]
impl WorkersApi for FakeWorkersApi {
    async fn generate_worker_name(&self) -> Result<String, ApiError> {
        if self.name_requests.fetch_add(1, Ordering::SeqCst) < self.failing_names {
            return Err(ApiError::Decode("name service unavailable".to_string()));
        }
        let n = self.names_issued.fetch_add(1, Ordering::SeqCst);
        Ok(format!("fake-{}", n))
    }

    async fn ensure_subdomain(&self) -> Result<String, ApiError> {
        if self.failing_subdomain {
            return Err(ApiError::api(
                StatusCode::FORBIDDEN,
                10000,
                "Authentication error",
            ));
        }
        Ok("fake".to_string())
    }

    fn get_worker_source(&self, worker_type: WorkerType) -> Result<WorkerSource, SourceError> {
        if self.missing_source {
            return Err(SourceError::NotFound(
                PathBuf::from("workers").join(worker_type.as_str()),
            ));
        }
        Ok(WorkerSource {
            script: format!("// {} worker", worker_type),
            wasm: worker_type.meta().wasm_file.map(|_| vec![0, 97, 115, 109]),
        })
    }

    async fn deploy_worker(&self, config: &DeploymentConfig<'_>) -> Result<String, ApiError> {
        self.deploy_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let index = index_of(&config.name);
        tokio::time::sleep(self.latency(index)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_attempts.contains(&index) {
            return Err(ApiError::api(
                StatusCode::BAD_REQUEST,
                10021,
                format!("could not deploy {}", config.name),
            ));
        }

        self.deployed.lock().unwrap().push(DeployedWorker {
            name: config.name.clone(),
            script: config.script_content.to_string(),
            wasm_len: config.wasm_content.map(<[u8]>::len),
            worker_type: config.worker_type,
        });
        self.remote.lock().unwrap().push(config.name.clone());
        Ok(format!("https://{}.fake.workers.dev", config.name))
    }

    async fn list_workers(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.remote.lock().unwrap().clone())
    }

    async fn delete_worker(&self, name: &str) -> Result<(), ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(DEPLOY_LATENCY).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_deletes.contains(name) {
            return Err(ApiError::api(
                StatusCode::NOT_FOUND,
                10007,
                "workers.api.error.script_not_found",
            ));
        }
        self.remote.lock().unwrap().retain(|n| n != name);
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

/// Answers token inspection with canned responses.
pub struct FakeTokenApi {
    verification: Option<TokenVerification>,
    details: TokenDetails,
    transport_failure: bool,
}

impl FakeTokenApi {
    pub fn new(verification: Option<TokenVerification>, details: TokenDetails) -> Self {
        FakeTokenApi {
            verification,
            details,
            transport_failure: false,
        }
    }

    pub fn active(details: TokenDetails) -> Self {
        let verification = TokenVerification {
            id: details.id.clone(),
            status: "active".to_string(),
        };
        FakeTokenApi::new(Some(verification), details)
    }

    /// Every call fails as if the API were unreachable.
    pub fn unreachable() -> Self {
        FakeTokenApi {
            verification: None,
            details: TokenDetails {
                id: String::new(),
                policies: vec![],
            },
            transport_failure: true,
        }
    }

    fn check_transport(&self) -> Result<(), ApiError> {
        if self.transport_failure {
            return Err(ApiError::api(
                StatusCode::SERVICE_UNAVAILABLE,
                0,
                "service unavailable",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenApi for FakeTokenApi {
    async fn verify(&self) -> Result<Option<TokenVerification>, ApiError> {
        self.check_transport()?;
        Ok(self.verification.clone())
    }

    async fn get(&self, _token_id: &str) -> Result<TokenDetails, ApiError> {
        self.check_transport()?;
        Ok(self.details.clone())
    }
}
