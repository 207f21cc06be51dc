//! doflex cloud abstraction
//!
//! Provider-neutral half of the volume driver: the remote object model, the
//! `VolumeService` trait every provider implements, and the attach/detach
//! lifecycle built on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              flex verb dispatch                 │
//! │        (attach / detach / is-attached)          │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 doflex-cloud                    │
//! │  ┌──────────────┐ ┌──────────────┐ ┌─────────┐  │
//! │  │  Lifecycle   │ │ NodeResolver │ │ device  │  │
//! │  └──────┬───────┘ └──────┬───────┘ └─────────┘  │
//! │  ┌──────▼────────────────▼──────────────────┐   │
//! │  │     trait VolumeService { ... }          │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │ digitalocean  │
//!           │   provider    │
//!           └───────────────┘
//! ```

pub mod device;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod resolver;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use device::{device_path, volume_name_from_device};
pub use error::{CloudError, Result};
pub use lifecycle::VolumeLifecycle;
pub use model::{ActionKind, ActionStatus, ComputeNode, RemoteAction, RemoteVolume};
pub use resolver::resolve_node;
pub use service::{PollConfig, VolumeService};
