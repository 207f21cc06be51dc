//! Verb dispatch

use crate::command::{Command, Verb};
use crate::plugin::VolumePlugin;
use crate::status::DriverStatus;

/// Runs parsed flex commands against a plugin
pub struct Manager<P: VolumePlugin> {
    plugin: P,
}

impl<P: VolumePlugin> Manager<P> {
    pub fn new(plugin: P) -> Self {
        Self { plugin }
    }

    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    /// Execute one command, mapping its verb to exactly one plugin call
    pub async fn execute(&self, command: &Command) -> Result<DriverStatus, P::Error> {
        let options = command.options().unwrap_or_default();
        let node_name = command.node_name().unwrap_or_default();
        let device = command.device().unwrap_or_default();
        let mount_dir = command.mount_dir().unwrap_or_default();

        tracing::debug!("Executing flex command {}", command.verb());

        match command.verb() {
            Verb::Init => self.plugin.init().await,
            Verb::GetVolumeName => self.plugin.get_volume_name(options).await,
            Verb::Attach => self.plugin.attach(options, node_name).await,
            Verb::Detach => self.plugin.detach(device, node_name).await,
            Verb::WaitForAttach => self.plugin.wait_for_attach(device, options).await,
            Verb::IsAttached => self.plugin.is_attached(options, node_name).await,
            Verb::MountDevice => self.plugin.mount_device(mount_dir, device, options).await,
            Verb::UnmountDevice => self.plugin.unmount_device(device).await,
            Verb::Mount => self.plugin.mount(mount_dir, options).await,
            Verb::Unmount => self.plugin.unmount(mount_dir).await,
        }
    }
}
