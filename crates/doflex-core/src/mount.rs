//! Host mount helper
//!
//! Wraps `findmnt`, `lsblk`, `mkfs`, `mount` and `umount`. Every step is a
//! plain sequential shell-out.

use crate::error::{FlexError, Result};
use async_trait::async_trait;
use std::os::unix::fs::FileTypeExt;
use std::process::Stdio;
use tokio::process::Command;

/// Formats and mounts block devices on the local host
#[async_trait]
pub trait Mounter: Send + Sync {
    /// Mount `device` at `target`, formatting it as `fs_type` first if needed.
    /// Does nothing when `target` is already a mount point.
    async fn mount_device(
        &self,
        device: &str,
        target: &str,
        fs_type: &str,
        read_only: bool,
    ) -> Result<()>;

    /// Unmount `target` if it is mounted
    async fn unmount(&self, target: &str) -> Result<()>;
}

/// `Mounter` backed by the host's util-linux tools
#[derive(Debug, Default, Clone)]
pub struct SystemMounter;

impl SystemMounter {
    pub fn new() -> Self {
        Self
    }

    /// Run a command and return its combined output, or fail with it
    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let command_line = format!("{} {}", program, args.join(" "));
        tracing::debug!("Running: {}", command_line);

        let output = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(FlexError::MountCommand {
                command: command_line,
                message: format!("{} output [{}]", output.status, combined.trim()),
            });
        }

        Ok(combined)
    }

    async fn is_mounted(&self, target: &str) -> Result<bool> {
        // findmnt exits non-zero when nothing is mounted there
        let output = Command::new("findmnt")
            .args(["-n", target])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await?;

        Ok(mount_target_matches(
            &String::from_utf8_lossy(&output.stdout),
            target,
        ))
    }

    async fn current_format(&self, device: &str) -> Result<String> {
        let output = self.run("lsblk", &["-n", "-o", "FSTYPE", device]).await?;
        Ok(parse_fs_type(&output))
    }
}

#[async_trait]
impl Mounter for SystemMounter {
    async fn mount_device(
        &self,
        device: &str,
        target: &str,
        fs_type: &str,
        read_only: bool,
    ) -> Result<()> {
        let metadata = tokio::fs::metadata(device).await.map_err(|e| {
            FlexError::MountCommand {
                command: format!("stat {}", device),
                message: e.to_string(),
            }
        })?;
        if !metadata.file_type().is_block_device() {
            return Err(FlexError::NotABlockDevice(device.to_string()));
        }

        if self.is_mounted(target).await? {
            tracing::debug!("{} is already mounted", target);
            return Ok(());
        }

        let format = self.current_format(device).await?;
        if format != fs_type {
            tracing::info!("Formatting {} as {} (found {:?})", device, fs_type, format);
            self.run("mkfs", &["-t", fs_type, device]).await?;
        }

        tokio::fs::create_dir_all(target).await?;

        let mut args = vec![device, target];
        if read_only {
            args.extend(["-o", "ro"]);
        }
        self.run("mount", &args).await?;
        tracing::info!("Mounted {} at {}", device, target);
        Ok(())
    }

    async fn unmount(&self, target: &str) -> Result<()> {
        if !self.is_mounted(target).await? {
            tracing::debug!("{} is not mounted, nothing to unmount", target);
            return Ok(());
        }

        self.run("umount", &[target]).await?;
        tracing::info!("Unmounted {}", target);
        Ok(())
    }
}

/// First word of `findmnt -n <target>` output equals the target
fn mount_target_matches(findmnt_output: &str, target: &str) -> bool {
    findmnt_output.split_whitespace().next() == Some(target)
}

/// Filesystem reported by `lsblk -n -o FSTYPE <device>`
///
/// Empty for an unformatted device without children. A device with child
/// devices (most probably partitions) gets a placeholder that never equals a
/// requested filesystem.
fn parse_fs_type(lsblk_output: &str) -> String {
    let output = lsblk_output.strip_suffix('\n').unwrap_or(lsblk_output);
    let mut lines = output.split('\n');
    let first = lines.next().unwrap_or_default().trim();

    if !first.is_empty() {
        return first.to_string();
    }
    if lines.next().is_none() {
        return String::new();
    }
    "unknown data, probably partitions".to_string()
}
