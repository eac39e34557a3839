//! Cloud provider error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reconciling the CA1 environment
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("{client} not found. Install it first: {install_hint}")]
    ClientNotInstalled {
        client: String,
        install_hint: String,
    },

    #[error("No authenticated session: {reason}\nHint: {login_hint}")]
    NotAuthenticated { reason: String, login_hint: String },

    #[error(
        "Bootstrap file not found: {0}\nHint: place the cloud-init file in the directory you run from"
    )]
    BootstrapFileMissing(PathBuf),

    #[error("Bootstrap file {path} is not valid UTF-8 text: {message}")]
    BootstrapFileInvalid { path: PathBuf, message: String },

    #[error("Could not obtain admin credential: {0}")]
    Credential(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Environment errors are operator misconfiguration, never transient.
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            CloudError::ClientNotInstalled { .. }
                | CloudError::NotAuthenticated { .. }
                | CloudError::BootstrapFileMissing(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
