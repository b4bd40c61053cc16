//! Checks that the configured API token can manage workers before anything
//! is deployed with it.

use std::collections::HashSet;

use thiserror::Error;

use crate::api::{ApiError, TokenApi};

/// Permission groups a token needs for every `proxyflare` command, in the
/// order they are reported when missing.
pub const WORKER_PERMISSIONS: [&str; 4] = [
    "Workers Scripts Write",
    "Workers Scripts Read",
    "Workers Routes Write",
    "Account Settings Read",
];

const ACTIVE: &str = "active";
const ALLOW: &str = "allow";

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Token verification failed: the API did not return a result for this token")]
    VerificationFailed,
    #[error("Token is not active (status: {0})")]
    NotActive(String),
    #[error("Missing required permissions: {}", .0.join(", "))]
    MissingPermissions(Vec<String>),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Verifies the token and returns its id.
pub async fn verify_token<T>(api: &T) -> Result<String, ValidationError>
where
    T: TokenApi + ?Sized,
{
    let verification = api.verify().await?.ok_or(ValidationError::VerificationFailed)?;
    log::info!(
        "token {} has status {}",
        verification.id,
        verification.status
    );

    if verification.status != ACTIVE {
        return Err(ValidationError::NotActive(verification.status));
    }
    Ok(verification.id)
}

/// Succeeds when the token's allow policies, taken together, grant every
/// group in [`WORKER_PERMISSIONS`].
///
/// Deny policies are not looked at: this checks that the grants exist, not
/// that nothing takes them away again.
pub async fn check_token_permissions<T>(api: &T, token_id: &str) -> Result<(), ValidationError>
where
    T: TokenApi + ?Sized,
{
    let details = api.get(token_id).await?;

    let granted: HashSet<&str> = details
        .policies
        .iter()
        .filter(|policy| policy.effect == ALLOW)
        .flat_map(|policy| policy.permission_groups.iter())
        .map(|group| group.name.as_str())
        .collect();
    log::debug!("token {} is granted {:?}", token_id, granted);

    let missing: Vec<String> = WORKER_PERMISSIONS
        .iter()
        .filter(|required| !granted.contains(*required))
        .map(|required| required.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingPermissions(missing))
    }
}
