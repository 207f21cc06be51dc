//! Remote volume service trait definition

use crate::error::Result;
use crate::model::{ComputeNode, RemoteAction, RemoteVolume};
use async_trait::async_trait;
use std::time::Duration;

/// Remote volume service abstraction
///
/// Every provider (DigitalOcean, ...) implements this trait. It is a thin
/// facade over the provider's compute/storage API; HTTP and auth concerns
/// stay inside the implementation. Failures are passed through to the
/// caller as they are and never retried here.
#[async_trait]
pub trait VolumeService: Send + Sync {
    /// Host block-device path prefix under which attached volumes appear
    fn device_prefix(&self) -> &str;

    async fn get_volume(&self, volume_id: &str) -> Result<RemoteVolume>;

    /// Look up a volume by name within a region
    ///
    /// Fails with `AmbiguousVolume` unless exactly one volume matches.
    async fn get_volume_by_name(&self, name: &str, region: &str) -> Result<RemoteVolume>;

    async fn get_compute_node(&self, node_id: &str) -> Result<ComputeNode>;

    /// List every compute node, following pagination until the last page
    async fn list_compute_nodes(&self) -> Result<Vec<ComputeNode>>;

    async fn request_attach(&self, volume_id: &str, node_id: &str) -> Result<RemoteAction>;

    async fn request_detach(&self, volume_id: &str, node_id: &str) -> Result<RemoteAction>;

    async fn get_action(&self, volume_id: &str, action_id: &str) -> Result<RemoteAction>;

    /// Region of the node this process runs on
    async fn current_region(&self) -> Result<String>;
}

/// Polling configuration for remote actions
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between two status fetches
    pub interval: Duration,

    /// Overall deadline for the action to reach a terminal status
    pub timeout: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(200),
        }
    }
}
