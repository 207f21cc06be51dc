//! doflex core
//!
//! The flex volume protocol: the driver is executed once per lifecycle
//! event with a verb and positional arguments, and answers with a single
//! JSON status record on stdout.
//!
//! - [`Command`]: argument vector parsing
//! - [`VolumeOptions`]: the JSON options payload
//! - [`VolumePlugin`]: per-provider operations, dispatched by [`Manager`]
//! - [`StatusReporter`]: writes the [`DriverStatus`] record
//! - [`mount`]: host-side format/mount helper

pub mod command;
pub mod error;
pub mod manager;
pub mod mount;
pub mod options;
pub mod plugin;
pub mod status;

pub use command::{Command, Verb};
pub use error::{FlexError, Result};
pub use manager::Manager;
pub use mount::{Mounter, SystemMounter};
pub use options::VolumeOptions;
pub use plugin::VolumePlugin;
pub use status::{DriverCapabilities, DriverStatus, Status, StatusReporter};
