use crate::api::TokenApi;
use crate::error::CommandError;
use crate::terminal::message::{Message, StdOut};
use crate::validation::{check_token_permissions, verify_token};

/// Verifies the token and its permissions, returning its id.
pub async fn check_token<T>(api: &T) -> Result<String, CommandError>
where
    T: TokenApi + ?Sized,
{
    let token_id = verify_token(api).await?;
    check_token_permissions(api, &token_id).await?;
    Ok(token_id)
}

pub async fn run<T>(api: &T) -> Result<(), CommandError>
where
    T: TokenApi + ?Sized,
{
    StdOut::working("Verifying your API token...");
    let token_id = check_token(api).await?;
    StdOut::success(&format!(
        "Token {} is active and can manage workers.",
        token_id
    ));
    Ok(())
}
