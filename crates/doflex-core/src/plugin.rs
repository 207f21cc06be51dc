//! Volume plugin capability trait

use crate::status::DriverStatus;
use async_trait::async_trait;

/// Operations a flex volume driver implements, one per verb
///
/// Each backing provider has its own implementation. Verbs a driver does
/// not handle keep the default body, which reports `Not supported`.
#[async_trait]
pub trait VolumePlugin: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn init(&self) -> Result<DriverStatus, Self::Error>;

    async fn get_volume_name(&self, options: &str) -> Result<DriverStatus, Self::Error>;

    async fn attach(&self, options: &str, node_name: &str) -> Result<DriverStatus, Self::Error>;

    async fn detach(&self, device: &str, node_name: &str) -> Result<DriverStatus, Self::Error>;

    async fn is_attached(&self, options: &str, node_name: &str)
    -> Result<DriverStatus, Self::Error>;

    async fn wait_for_attach(
        &self,
        _device: &str,
        _options: &str,
    ) -> Result<DriverStatus, Self::Error> {
        Ok(DriverStatus::not_supported())
    }

    async fn mount_device(
        &self,
        _mount_dir: &str,
        _device: &str,
        _options: &str,
    ) -> Result<DriverStatus, Self::Error> {
        Ok(DriverStatus::not_supported())
    }

    async fn unmount_device(&self, _device: &str) -> Result<DriverStatus, Self::Error> {
        Ok(DriverStatus::not_supported())
    }

    async fn mount(&self, _mount_dir: &str, _options: &str) -> Result<DriverStatus, Self::Error> {
        Ok(DriverStatus::not_supported().with_message("mount"))
    }

    async fn unmount(&self, _mount_dir: &str) -> Result<DriverStatus, Self::Error> {
        Ok(DriverStatus::not_supported().with_message("unmount"))
    }
}
