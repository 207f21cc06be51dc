//! Cloud provider error types

use thiserror::Error;

/// Errors raised by the attach/detach lifecycle and by `VolumeService`
/// implementations.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("could not match node {0:?} to a compute node name, private IP or public IP")]
    NodeNotFound(String),

    #[error("expected exactly one volume named {name:?} in region {region:?}, found {found}")]
    AmbiguousVolume {
        name: String,
        region: String,
        found: usize,
    },

    #[error("storage action failed at the provider: {0}")]
    RemoteActionFailed(String),

    #[error("received unexpected action status {0:?} from the provider")]
    UnexpectedActionStatus(String),

    #[error("attaching volume {volume_id:?} timed out{}", detail(.last_error))]
    AttachTimeout {
        volume_id: String,
        last_error: Option<String>,
    },

    #[error("detaching volume {volume_id:?} timed out{}", detail(.last_error))]
    DetachTimeout {
        volume_id: String,
        last_error: Option<String>,
    },

    #[error("device path {0:?} does not look like a provider volume")]
    NotAProviderDevice(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Whether a failed action fetch may succeed on a later poll. A response
    /// that cannot be decoded will not decode next time either.
    pub fn is_transient(&self) -> bool {
        !matches!(self, CloudError::Decode(_) | CloudError::Json(_))
    }
}

fn detail(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(": {e}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
