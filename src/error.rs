use thiserror::Error;

use crate::validation::ValidationError;

/// The errors a command can end with.
///
/// Everything that stops a command is translated into one of these before it
/// reaches the user, so the message says what kind of problem to go fix.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad or missing settings, or an invalid flag value.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Anything that went wrong while talking to the platform or reading
    /// worker artifacts.
    #[error("Worker error: {0}")]
    Worker(String),
    /// The API token was rejected.
    #[error("Token validation failed: {0}")]
    Validation(#[from] ValidationError),
}
