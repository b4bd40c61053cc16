use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::http::ClientError;

/// One entry of the `errors` array in a Cloudflare API response.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{}", format_errors(.status, .errors))]
    Api {
        status: StatusCode,
        errors: Vec<ApiErrorDetail>,
    },
    #[error("Unexpected response from the Cloudflare API: {0}")]
    Decode(String),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ApiError {
    pub fn api(status: StatusCode, code: u16, message: impl Into<String>) -> Self {
        ApiError::Api {
            status,
            errors: vec![ApiErrorDetail {
                code,
                message: message.into(),
            }],
        }
    }

    /// True when the API rejected the credential or the account rather than
    /// the request itself.
    pub fn is_auth_error(&self) -> bool {
        match self {
            ApiError::Api { status, errors } => {
                *status == StatusCode::UNAUTHORIZED
                    || *status == StatusCode::FORBIDDEN
                    || errors.iter().any(|e| AUTH_ERROR_CODES.contains(&e.code))
            }
            _ => false,
        }
    }

    pub fn has_code(&self, code: u16) -> bool {
        match self {
            ApiError::Api { errors, .. } => errors.iter().any(|e| e.code == code),
            _ => false,
        }
    }
}

const AUTH_ERROR_CODES: &[u16] = &[6003, 9106, 9109, 10000, 10001];

// Formats API errors for printing, one `Code N: message` line per error, with
// a hint for codes where we know what the user should do about it.
fn format_errors(status: &StatusCode, errors: &[ApiErrorDetail]) -> String {
    let mut lines: Vec<String> = errors
        .iter()
        .map(|error| match suggestion(error.code) {
            Some(help) => format!("Code {}: {}\n  {}", error.code, error.message, help),
            None => format!("Code {}: {}", error.code, error.message),
        })
        .collect();

    if let Some(context) = status_context(*status) {
        lines.push(context.to_string());
    }
    if lines.is_empty() {
        lines.push(format!("Cloudflare API returned status {}", status));
    }
    lines.join("\n")
}

// Provides more detailed explanations of API error codes.
fn suggestion(code: u16) -> Option<&'static str> {
    match code {
        6003 | 9106 | 9109 => Some("Your API token might be expired, altered, or missing permissions. Run `proxyflare verify` to check it."),
        10000 | 10001 => Some("Your authentication is invalid. Check PROXYFLARE_API_TOKEN and PROXYFLARE_ACCOUNT_ID."),
        10034 => Some("You need to verify your account's email address before you can deploy workers. Log in to https://dash.cloudflare.com to do so."),
        10037 => Some("The account has reached its limit of worker scripts. Delete some with `proxyflare delete`."),
        _ => None,
    }
}

// For handling cases where the API gateway returns errors via HTTP status codes
// (no API-specific, more granular error code is given).
fn status_context(status: StatusCode) -> Option<&'static str> {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            Some("Returned status code 429, Too Many Requests. Try again with a lower --concurrency")
        }
        StatusCode::PAYLOAD_TOO_LARGE => Some("Returned status code 413, Payload Too Large. The worker bundle is too big to upload"),
        StatusCode::GATEWAY_TIMEOUT => Some("Returned status code 504, Gateway Timeout. Please try again in a few seconds"),
        _ => None,
    }
}
