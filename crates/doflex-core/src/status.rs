//! Driver status record and its reporter
//!
//! Exactly one record is written per invocation; it is the only output the
//! orchestrator reads.

use serde::{Deserialize, Serialize};
use std::io::Write;

/// Outcome code of a driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Success,
    Failure,
    #[serde(rename = "Not supported")]
    NotSupported,
}

/// Return value of a driver call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStatus {
    pub status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(rename = "device", skip_serializing_if = "Option::is_none")]
    pub device_path: Option<String>,

    #[serde(rename = "volumeName", skip_serializing_if = "Option::is_none")]
    pub volume_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached: Option<bool>,

    #[serde(rename = "Capabilities", skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<DriverCapabilities>,
}

/// Features the driver advertises on `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverCapabilities {
    pub attach: bool,

    #[serde(rename = "selinuxRelabel")]
    pub selinux_relabel: bool,
}

impl DriverStatus {
    fn with_status(status: Status) -> Self {
        Self {
            status,
            message: None,
            device_path: None,
            volume_name: None,
            attached: None,
            capabilities: None,
        }
    }

    pub fn success() -> Self {
        Self::with_status(Status::Success)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::with_status(Status::Failure).with_message(message)
    }

    pub fn not_supported() -> Self {
        Self::with_status(Status::NotSupported)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_device(mut self, device_path: impl Into<String>) -> Self {
        self.device_path = Some(device_path.into());
        self
    }

    pub fn with_volume_name(mut self, volume_name: impl Into<String>) -> Self {
        self.volume_name = Some(volume_name.into());
        self
    }

    pub fn with_attached(mut self, attached: bool) -> Self {
        self.attached = Some(attached);
        self
    }

    pub fn with_capabilities(mut self, capabilities: DriverCapabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }
}

/// Writes status records to the orchestrator's output channel
pub struct StatusReporter<W: Write> {
    output: W,
}

impl StatusReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> StatusReporter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    /// Write one status record as a single JSON line
    pub fn write_status(&mut self, status: &DriverStatus) -> std::io::Result<()> {
        let json = serde_json::to_string(status)?;
        writeln!(self.output, "{}", json)?;
        self.output.flush()
    }

    /// Write a `Failure` record carrying the error message
    ///
    /// Falls back to a plain line if the record cannot be written as JSON.
    pub fn write_error(&mut self, error: &dyn std::fmt::Display) {
        let status = DriverStatus::failure(error.to_string());
        if let Err(e) = self.write_status(&status) {
            tracing::error!("Could not write error record: {}", e);
            let _ = writeln!(
                self.output,
                "could not return JSON encoded error message: {}",
                e
            );
        }
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}
