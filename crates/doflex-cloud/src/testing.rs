//! In-memory `VolumeService` for tests
//!
//! Holds a fixed set of nodes and volumes, replays a script of action
//! statuses and counts every call so tests can assert which remote
//! operations happened.

use crate::error::{CloudError, Result};
use crate::model::{ActionKind, ActionStatus, ComputeNode, RemoteAction, RemoteVolume};
use crate::service::VolumeService;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

pub const TEST_DEVICE_PREFIX: &str = "/dev/disk/by-id/scsi-0TEST_Volume_";

/// Number of calls per `VolumeService` operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_volume: usize,
    pub get_volume_by_name: usize,
    pub get_compute_node: usize,
    pub list_compute_nodes: usize,
    pub request_attach: usize,
    pub request_detach: usize,
    pub get_action: usize,
    pub current_region: usize,
}

impl CallCounts {
    /// Attach and detach requests issued
    pub fn mutations(&self) -> usize {
        self.request_attach + self.request_detach
    }

    pub fn total(&self) -> usize {
        self.get_volume
            + self.get_volume_by_name
            + self.get_compute_node
            + self.list_compute_nodes
            + self.mutations()
            + self.get_action
            + self.current_region
    }
}

enum ActionStep {
    Status(ActionStatus),
    FetchError(String),
    DecodeError(String),
}

#[derive(Default)]
struct FakeState {
    nodes: Vec<ComputeNode>,
    volumes: Vec<RemoteVolume>,
    steps: VecDeque<ActionStep>,
    mutation_error: Option<String>,
    calls: CallCounts,
    next_action_id: u64,
}

/// Fake provider backed by in-memory state
pub struct FakeVolumeService {
    region: String,
    state: Mutex<FakeState>,
}

impl Default for FakeVolumeService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeVolumeService {
    pub fn new() -> Self {
        Self {
            region: "nyc1".to_string(),
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_node(self, node: ComputeNode) -> Self {
        self.state().nodes.push(node);
        self
    }

    pub fn with_volume(self, volume: RemoteVolume) -> Self {
        self.state().volumes.push(volume);
        self
    }

    /// Statuses returned by successive `get_action` calls. Once the script
    /// runs out, actions stay `in-progress`.
    pub fn with_action_statuses<'a>(self, statuses: impl IntoIterator<Item = &'a str>) -> Self {
        self.state()
            .steps
            .extend(statuses.into_iter().map(|s| ActionStep::Status(s.into())));
        self
    }

    /// Make the next scripted `get_action` call fail
    pub fn with_action_fetch_error(self, message: impl Into<String>) -> Self {
        self.state()
            .steps
            .push_back(ActionStep::FetchError(message.into()));
        self
    }

    /// Make the next scripted `get_action` call return an undecodable response
    pub fn with_action_decode_error(self, message: impl Into<String>) -> Self {
        self.state()
            .steps
            .push_back(ActionStep::DecodeError(message.into()));
        self
    }

    /// Make every attach/detach request fail with an API error
    pub fn fail_mutations_with(self, message: impl Into<String>) -> Self {
        self.state().mutation_error = Some(message.into());
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn new_action(&self, kind: ActionKind, volume_id: &str, node_id: &str) -> Result<RemoteAction> {
        let mut state = self.state();
        if let Some(message) = &state.mutation_error {
            return Err(CloudError::ApiError(message.clone()));
        }
        state.next_action_id += 1;
        Ok(RemoteAction {
            id: state.next_action_id.to_string(),
            kind,
            status: ActionStatus::InProgress,
            description: format!("{kind} volume {volume_id} on node {node_id}"),
        })
    }
}

#[async_trait]
impl VolumeService for FakeVolumeService {
    fn device_prefix(&self) -> &str {
        TEST_DEVICE_PREFIX
    }

    async fn get_volume(&self, volume_id: &str) -> Result<RemoteVolume> {
        let mut state = self.state();
        state.calls.get_volume += 1;
        state
            .volumes
            .iter()
            .find(|v| v.id == volume_id)
            .cloned()
            .ok_or_else(|| CloudError::ResourceNotFound(format!("volume {volume_id}")))
    }

    async fn get_volume_by_name(&self, name: &str, region: &str) -> Result<RemoteVolume> {
        let mut state = self.state();
        state.calls.get_volume_by_name += 1;
        let mut matches: Vec<_> = state
            .volumes
            .iter()
            .filter(|v| v.name == name && v.region == region)
            .cloned()
            .collect();
        if matches.len() != 1 {
            return Err(CloudError::AmbiguousVolume {
                name: name.to_string(),
                region: region.to_string(),
                found: matches.len(),
            });
        }
        Ok(matches.remove(0))
    }

    async fn get_compute_node(&self, node_id: &str) -> Result<ComputeNode> {
        let mut state = self.state();
        state.calls.get_compute_node += 1;
        state
            .nodes
            .iter()
            .find(|n| n.id == node_id)
            .cloned()
            .ok_or_else(|| CloudError::ResourceNotFound(format!("compute node {node_id}")))
    }

    async fn list_compute_nodes(&self) -> Result<Vec<ComputeNode>> {
        let mut state = self.state();
        state.calls.list_compute_nodes += 1;
        Ok(state.nodes.clone())
    }

    async fn request_attach(&self, volume_id: &str, node_id: &str) -> Result<RemoteAction> {
        self.state().calls.request_attach += 1;
        self.new_action(ActionKind::Attach, volume_id, node_id)
    }

    async fn request_detach(&self, volume_id: &str, node_id: &str) -> Result<RemoteAction> {
        self.state().calls.request_detach += 1;
        self.new_action(ActionKind::Detach, volume_id, node_id)
    }

    async fn get_action(&self, volume_id: &str, action_id: &str) -> Result<RemoteAction> {
        let mut state = self.state();
        state.calls.get_action += 1;
        let status = match state.steps.pop_front() {
            Some(ActionStep::Status(status)) => status,
            Some(ActionStep::FetchError(message)) => return Err(CloudError::Transport(message)),
            Some(ActionStep::DecodeError(message)) => return Err(CloudError::Decode(message)),
            None => ActionStatus::InProgress,
        };
        Ok(RemoteAction {
            id: action_id.to_string(),
            kind: ActionKind::Attach,
            status,
            description: format!("action {action_id} on volume {volume_id}"),
        })
    }

    async fn current_region(&self) -> Result<String> {
        self.state().calls.current_region += 1;
        Ok(self.region.clone())
    }
}
