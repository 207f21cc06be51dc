//! DigitalOcean volume plugin
//!
//! Maps each flex verb onto the node resolver, the attach/detach lifecycle
//! and the host mount helper.

use crate::error::{DigitalOceanError, Result};
use async_trait::async_trait;
use doflex_cloud::{
    PollConfig, VolumeLifecycle, VolumeService, resolve_node, volume_name_from_device,
};
use doflex_core::{DriverCapabilities, DriverStatus, Mounter, VolumeOptions, VolumePlugin};
use std::sync::Arc;

const INIT_MESSAGE: &str = "DigitalOcean flex driver initialized";

/// Flex volume plugin backed by DigitalOcean block storage
pub struct DigitalOceanPlugin {
    service: Arc<dyn VolumeService>,
    mounter: Arc<dyn Mounter>,
    poll: PollConfig,
}

impl DigitalOceanPlugin {
    pub fn new(
        service: Arc<dyn VolumeService>,
        mounter: Arc<dyn Mounter>,
        poll: PollConfig,
    ) -> Self {
        Self {
            service,
            mounter,
            poll,
        }
    }

    fn lifecycle(&self) -> VolumeLifecycle<'_> {
        VolumeLifecycle::new(self.service.as_ref(), self.poll.clone())
    }
}

#[async_trait]
impl VolumePlugin for DigitalOceanPlugin {
    type Error = DigitalOceanError;

    async fn init(&self) -> Result<DriverStatus> {
        Ok(DriverStatus::success()
            .with_message(INIT_MESSAGE)
            .with_capabilities(DriverCapabilities {
                attach: true,
                selinux_relabel: true,
            }))
    }

    async fn get_volume_name(&self, options: &str) -> Result<DriverStatus> {
        let options = VolumeOptions::parse(options)?;
        let volume_id = options.volume_id()?;
        Ok(DriverStatus::success().with_volume_name(volume_id))
    }

    async fn attach(&self, options: &str, node_name: &str) -> Result<DriverStatus> {
        let options = VolumeOptions::parse(options)?;
        let volume_id = options.volume_id()?;

        let node = resolve_node(self.service.as_ref(), node_name).await?;
        let device = self.lifecycle().attach(volume_id, &node.id).await?;

        tracing::info!("Volume {} attached to {} as {}", volume_id, node_name, device);
        Ok(DriverStatus::success().with_device(device))
    }

    async fn detach(&self, device: &str, node_name: &str) -> Result<DriverStatus> {
        let volume_name = volume_name_from_device(self.service.device_prefix(), device)?;

        let region = self.service.current_region().await?;
        let volume = self.service.get_volume_by_name(volume_name, &region).await?;
        let node = resolve_node(self.service.as_ref(), node_name).await?;
        self.lifecycle().detach(&volume.id, &node.id).await?;

        tracing::info!("Volume {} detached from {}", volume.id, node_name);
        Ok(DriverStatus::success())
    }

    async fn is_attached(&self, options: &str, node_name: &str) -> Result<DriverStatus> {
        let options = VolumeOptions::parse(options)?;
        let volume_id = options.volume_id()?;

        let node = resolve_node(self.service.as_ref(), node_name).await?;
        let attached = self.lifecycle().is_attached(volume_id, &node.id).await?;
        Ok(DriverStatus::success().with_attached(attached))
    }

    async fn mount_device(
        &self,
        mount_dir: &str,
        device: &str,
        options: &str,
    ) -> Result<DriverStatus> {
        let options = VolumeOptions::parse(options)?;
        self.mounter
            .mount_device(device, mount_dir, options.fs_type(), options.is_read_only())
            .await?;
        Ok(DriverStatus::success())
    }

    async fn unmount_device(&self, device: &str) -> Result<DriverStatus> {
        self.mounter.unmount(device).await?;
        Ok(DriverStatus::success())
    }
}
