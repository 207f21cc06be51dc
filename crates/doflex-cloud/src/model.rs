//! Snapshots of remote objects
//!
//! Every value here is a read-only snapshot returned by a `VolumeService`
//! query. Nothing is cached between calls: decisions that depend on
//! attachment state always re-fetch.

/// A block storage volume as seen by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVolume {
    /// Provider-assigned identifier
    pub id: String,

    /// Human name, also used by the host to name the block device
    pub name: String,

    /// Region slug the volume lives in
    pub region: String,

    /// Compute nodes currently holding the volume attached
    pub attached_node_ids: Vec<String>,
}

impl RemoteVolume {
    pub fn is_attached_to(&self, node_id: &str) -> bool {
        self.attached_node_ids.iter().any(|id| id == node_id)
    }
}

/// A compute node (droplet, instance, ...) as seen by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeNode {
    pub id: String,

    pub name: String,

    /// Volumes attached to the node. Only complete when the node was
    /// fetched by id; list results may omit it.
    pub attached_volume_ids: Vec<String>,

    pub private_ipv4: Option<String>,

    pub public_ipv4: Option<String>,
}

impl ComputeNode {
    pub fn has_volume(&self, volume_id: &str) -> bool {
        self.attached_volume_ids.iter().any(|id| id == volume_id)
    }

    /// Whether `address` equals the private or the public address, in that order
    pub fn has_address(&self, address: &str) -> bool {
        self.private_ipv4.as_deref() == Some(address)
            || self.public_ipv4.as_deref() == Some(address)
    }
}

/// An asynchronous attach or detach mutation tracked by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAction {
    pub id: String,

    pub kind: ActionKind,

    pub status: ActionStatus,

    /// Provider-side description, reported when the action errors
    pub description: String,
}

/// Which volume mutation an action performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Attach,
    Detach,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Attach => write!(f, "attach"),
            ActionKind::Detach => write!(f, "detach"),
        }
    }
}

/// Status of a `RemoteAction`
///
/// Values the driver does not know are kept verbatim in `Unknown` so they
/// can be reported back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    InProgress,
    Completed,
    Errored,
    Unknown(String),
}

impl From<String> for ActionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "in-progress" => ActionStatus::InProgress,
            "completed" => ActionStatus::Completed,
            "errored" => ActionStatus::Errored,
            _ => ActionStatus::Unknown(value),
        }
    }
}

impl From<&str> for ActionStatus {
    fn from(value: &str) -> Self {
        ActionStatus::from(value.to_string())
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionStatus::InProgress => write!(f, "in-progress"),
            ActionStatus::Completed => write!(f, "completed"),
            ActionStatus::Errored => write!(f, "errored"),
            ActionStatus::Unknown(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_status_from_wire() {
        assert_eq!(ActionStatus::from("in-progress"), ActionStatus::InProgress);
        assert_eq!(ActionStatus::from("completed"), ActionStatus::Completed);
        assert_eq!(ActionStatus::from("errored"), ActionStatus::Errored);
        assert_eq!(
            ActionStatus::from("paused"),
            ActionStatus::Unknown("paused".to_string())
        );
    }

    #[test]
    fn test_unknown_status_is_reported_verbatim() {
        let status = ActionStatus::from("rolling-back".to_string());
        assert_eq!(status, ActionStatus::Unknown("rolling-back".to_string()));
        assert_eq!(status.to_string(), "rolling-back");
        assert_eq!(ActionStatus::InProgress.to_string(), "in-progress");
    }

    #[test]
    fn test_node_address_match() {
        let node = ComputeNode {
            id: "1".to_string(),
            name: "worker-1".to_string(),
            attached_volume_ids: vec!["v1".to_string()],
            private_ipv4: Some("10.0.0.2".to_string()),
            public_ipv4: None,
        };
        assert!(node.has_address("10.0.0.2"));
        assert!(!node.has_address("203.0.113.7"));
        assert!(node.has_volume("v1"));
        assert!(!node.has_volume("v2"));
    }
}
