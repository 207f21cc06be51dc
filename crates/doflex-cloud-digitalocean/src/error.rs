//! DigitalOcean provider error types

use doflex_cloud::CloudError;
use doflex_core::FlexError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigitalOceanError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("DigitalOcean API returned {status} ({id}): {message}")]
    Api {
        status: u16,
        id: String,
        message: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("no DigitalOcean API token configured")]
    MissingToken,

    #[error("invalid droplet id {0:?}")]
    InvalidDropletId(String),

    #[error("unexpected action type {0:?}")]
    UnexpectedActionType(String),

    #[error("droplet metadata unavailable: {0}")]
    Metadata(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Flex(#[from] FlexError),

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

impl From<DigitalOceanError> for CloudError {
    fn from(err: DigitalOceanError) -> Self {
        match err {
            DigitalOceanError::NotFound(message) => CloudError::ResourceNotFound(message),
            DigitalOceanError::InvalidDropletId(id) => {
                CloudError::ResourceNotFound(format!("droplet {id}"))
            }
            DigitalOceanError::Unauthorized(message) => CloudError::AuthenticationFailed(message),
            DigitalOceanError::MissingToken => {
                CloudError::AuthenticationFailed("no DigitalOcean API token configured".to_string())
            }
            DigitalOceanError::Http(e) if e.is_decode() => CloudError::Decode(e.to_string()),
            DigitalOceanError::Http(e) => CloudError::Transport(e.to_string()),
            DigitalOceanError::UnexpectedActionType(kind) => {
                CloudError::Decode(format!("unexpected action type {kind:?}"))
            }
            DigitalOceanError::Json(e) => CloudError::Json(e),
            DigitalOceanError::Cloud(e) => e,
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DigitalOceanError>;
