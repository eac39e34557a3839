//! Azure provider error types

use ca1_cloud::CloudError;
use thiserror::Error;

pub const INSTALL_HINT: &str = "https://aka.ms/installazurecli";

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("Azure CLI (az) not found. Please install: {}", INSTALL_HINT)]
    AzNotFound,

    #[error("az {command} failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unexpected az output: {0}")]
    InvalidOutput(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AzureError>;

impl From<AzureError> for CloudError {
    fn from(err: AzureError) -> Self {
        match err {
            AzureError::AzNotFound => CloudError::ClientNotInstalled {
                client: "Azure CLI (az)".to_string(),
                install_hint: INSTALL_HINT.to_string(),
            },
            failed @ AzureError::CommandFailed { .. } => {
                CloudError::CommandFailed(failed.to_string())
            }
            AzureError::NotFound(name) => CloudError::ApiError(format!("{} not found", name)),
            AzureError::InvalidOutput(message) => CloudError::InvalidResponse(message),
            AzureError::JsonError(e) => CloudError::Json(e),
            AzureError::IoError(e) => CloudError::Io(e),
        }
    }
}
