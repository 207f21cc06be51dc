//! Device path <-> volume identity mapping
//!
//! The host exposes an attached volume as `<prefix><volume name>`. The
//! volume *name* is the only canonical token in a device path; turning it
//! back into a volume id needs a remote lookup by name.

use crate::error::{CloudError, Result};

/// Device path of a volume named `volume_name`
pub fn device_path(prefix: &str, volume_name: &str) -> String {
    format!("{}{}", prefix, volume_name)
}

/// Extract the volume name from a device path
///
/// Pure string operation, the inverse of [`device_path`].
pub fn volume_name_from_device<'a>(prefix: &str, device: &'a str) -> Result<&'a str> {
    match device.strip_prefix(prefix) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(CloudError::NotAProviderDevice(device.to_string())),
    }
}
