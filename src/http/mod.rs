use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, ClientBuilder};
use thiserror::Error;

use crate::settings::ApiToken;

pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

pub const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("The API token contains characters that can't be sent in an HTTP header. Check api_token for stray whitespace or quotes.")]
    InvalidToken(#[source] InvalidHeaderValue),
    #[error(transparent)]
    Build(#[from] reqwest::Error),
}

/// Client for the Cloudflare API, authenticating every request with `token`.
pub fn auth_client(token: &ApiToken) -> Result<Client, ClientError> {
    let mut headers = headers();
    headers.insert(
        AUTHORIZATION,
        bearer(token).map_err(ClientError::InvalidToken)?,
    );

    let client = builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    Ok(client)
}

/// Client for requests sent through deployed workers.
pub fn client(timeout: Duration) -> Result<Client, reqwest::Error> {
    builder().default_headers(headers()).timeout(timeout).build()
}

fn builder() -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS))
        .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS))
}

fn headers() -> HeaderMap {
    let mut headers = HeaderMap::default();
    headers.insert(USER_AGENT, HeaderValue::from_static(user_agent()));
    headers
}

fn user_agent() -> &'static str {
    concat!("proxyflare/", env!("CARGO_PKG_VERSION"))
}

fn bearer(token: &ApiToken) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))?;
    value.set_sensitive(true);
    Ok(value)
}
