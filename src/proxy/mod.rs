//! Sends requests out through deployed workers.
//!
//! Every deployed worker forwards whatever URL it is given in its `url`
//! query parameter, so spreading requests over a pool of them spreads the
//! egress addresses they come from.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::{Client, Response};
use thiserror::Error;
use url::Url;

use crate::http;
use crate::results::WorkerResultFile;

const TARGET_PARAM: &str = "url";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("There are no workers to send requests through. Run `proxyflare create` first.")]
    Empty,
    #[error("Worker {name} has an invalid url {url}: {source}")]
    InvalidUrl {
        name: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Round-robin pool of worker URLs.
#[derive(Debug)]
pub struct ProxyPool {
    workers: Vec<Url>,
    next: AtomicUsize,
    client: Client,
}

impl ProxyPool {
    /// A pool over every record in `results`. Requests sent through it give
    /// up after `timeout`.
    pub fn new(results: &WorkerResultFile, timeout: Duration) -> Result<Self, ProxyError> {
        let workers = results
            .into_iter()
            .map(|record| {
                Url::parse(&record.url).map_err(|source| ProxyError::InvalidUrl {
                    name: record.name.clone(),
                    url: record.url.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if workers.is_empty() {
            return Err(ProxyError::Empty);
        }
        log::info!("proxy pool has {} workers", workers.len());

        Ok(ProxyPool {
            workers,
            next: AtomicUsize::new(0),
            client: http::client(timeout)?,
        })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Where to send a request for `target`, using the next worker in turn.
    pub fn proxied_url(&self, target: &Url) -> Url {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        let mut url = self.workers[index].clone();
        url.set_path("/");
        url.query_pairs_mut()
            .clear()
            .append_pair(TARGET_PARAM, target.as_str());
        url
    }

    /// GETs `target` through the next worker.
    pub async fn fetch(&self, target: &Url) -> Result<Response, ProxyError> {
        let url = self.proxied_url(target);
        log::info!("fetching {} via {}", target, url);
        let response = self.client.get(url).send().await?;
        log::debug!("Status Code: {}", response.status());
        Ok(response)
    }
}
