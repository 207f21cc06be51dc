//! DigitalOcean provider for doflex
//!
//! [`DigitalOceanClient`] implements `VolumeService` over the v2 REST API and
//! the droplet metadata service. [`DigitalOceanPlugin`] is the flex
//! `VolumePlugin` built on top of it.

pub mod api;
pub mod error;
pub mod plugin;

pub use api::{ClientConfig, DEVICE_PREFIX, DigitalOceanClient};
pub use error::{DigitalOceanError, Result};
pub use plugin::DigitalOceanPlugin;
