//! Attach/detach lifecycle
//!
//! Decides whether a remote mutation is needed at all, issues it, and waits
//! for the provider's action to settle. Attachment state is always
//! re-fetched right before deciding, so repeating an attach or detach after
//! a partial success is a no-op.

use crate::device;
use crate::error::{CloudError, Result};
use crate::model::{ActionKind, ActionStatus, RemoteAction};
use crate::service::{PollConfig, VolumeService};
use tokio::time::{Instant, MissedTickBehavior};

/// Attach/detach engine bound to one provider
pub struct VolumeLifecycle<'a> {
    service: &'a dyn VolumeService,
    poll: PollConfig,
}

impl<'a> VolumeLifecycle<'a> {
    pub fn new(service: &'a dyn VolumeService, poll: PollConfig) -> Self {
        Self { service, poll }
    }

    /// Attach a volume to a node and return its host device path
    pub async fn attach(&self, volume_id: &str, node_id: &str) -> Result<String> {
        // list results lack the attached volumes, so fetch the node itself
        let node = self.service.get_compute_node(node_id).await?;
        let volume = self.service.get_volume(volume_id).await?;

        if node.has_volume(&volume.id) {
            tracing::debug!(
                "Volume {} already attached to node {}, skipping attach",
                volume.id,
                node.id
            );
        } else {
            tracing::info!("Attaching volume {} to node {}", volume.id, node.id);
            let action = self.service.request_attach(&volume.id, &node.id).await?;
            self.wait_for_action(&volume.id, &action).await?;
        }

        Ok(device::device_path(self.service.device_prefix(), &volume.name))
    }

    /// Detach a volume from a node
    pub async fn detach(&self, volume_id: &str, node_id: &str) -> Result<()> {
        let volume = self.service.get_volume(volume_id).await?;

        if !volume.is_attached_to(node_id) {
            tracing::debug!(
                "Volume {} not attached to node {}, skipping detach",
                volume.id,
                node_id
            );
            return Ok(());
        }

        tracing::info!("Detaching volume {} from node {}", volume.id, node_id);
        let action = self.service.request_detach(&volume.id, node_id).await?;
        self.wait_for_action(&volume.id, &action).await?;
        Ok(())
    }

    /// Whether a node currently holds a volume
    pub async fn is_attached(&self, volume_id: &str, node_id: &str) -> Result<bool> {
        let node = self.service.get_compute_node(node_id).await?;
        Ok(node.has_volume(volume_id))
    }

    /// Poll an action until it completes, errors, or the deadline passes
    ///
    /// A transient fetch failure is remembered and polling goes on; its
    /// message is appended to the timeout error. An undecodable response
    /// ends polling at once. The ticker and deadline are dropped on
    /// every return path.
    pub async fn wait_for_action(
        &self,
        volume_id: &str,
        action: &RemoteAction,
    ) -> Result<RemoteAction> {
        let deadline = Instant::now() + self.poll.timeout;
        let expired = tokio::time::sleep_until(deadline);
        tokio::pin!(expired);

        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.poll.interval, self.poll.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_error: Option<CloudError> = None;

        loop {
            tokio::select! {
                biased;

                _ = &mut expired => {
                    return Err(timeout_error(action.kind, volume_id, last_error));
                }
                _ = ticker.tick() => {
                    let fetch = self.service.get_action(volume_id, &action.id);
                    let fetched = match tokio::time::timeout_at(deadline, fetch).await {
                        Ok(fetched) => fetched,
                        Err(_) => return Err(timeout_error(action.kind, volume_id, last_error)),
                    };

                    match fetched {
                        Ok(current) => match current.status {
                            ActionStatus::Completed => {
                                tracing::info!(
                                    "{} action {} for volume {} completed",
                                    current.kind,
                                    current.id,
                                    volume_id
                                );
                                return Ok(current);
                            }
                            ActionStatus::Errored => {
                                return Err(CloudError::RemoteActionFailed(current.description));
                            }
                            ActionStatus::InProgress => {
                                tracing::debug!("Action {} still in progress", current.id);
                            }
                            ActionStatus::Unknown(status) => {
                                return Err(CloudError::UnexpectedActionStatus(status));
                            }
                        },
                        Err(e) if !e.is_transient() => return Err(e),
                        Err(e) => {
                            tracing::warn!("Failed to fetch action {}: {}", action.id, e);
                            last_error = Some(e);
                        }
                    }
                }
            }
        }
    }
}

fn timeout_error(kind: ActionKind, volume_id: &str, last_error: Option<CloudError>) -> CloudError {
    let volume_id = volume_id.to_string();
    let last_error = last_error.map(|e| e.to_string());
    match kind {
        ActionKind::Attach => CloudError::AttachTimeout {
            volume_id,
            last_error,
        },
        ActionKind::Detach => CloudError::DetachTimeout {
            volume_id,
            last_error,
        },
    }
}
