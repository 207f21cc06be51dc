//! Volume options passed as the JSON payload of a flex call

use crate::error::{FlexError, Result};
use serde::Deserialize;

const DEFAULT_FS_TYPE: &str = "ext4";

/// Decoded `<options-json>` argument
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VolumeOptions {
    #[serde(rename = "kubernetes.io/fsType", alias = "fsType", default)]
    pub fs_type: String,

    #[serde(
        rename = "kubernetes.io/pvOrVolumeName",
        alias = "pvOrVolumeName",
        default
    )]
    pub pv_or_volume_name: String,

    #[serde(rename = "kubernetes.io/readwrite", alias = "readwrite", default)]
    pub read_write: String,

    #[serde(rename = "volumeName", default)]
    pub volume_name: Option<String>,

    #[serde(rename = "volumeID", default)]
    pub volume_id: Option<String>,
}

impl VolumeOptions {
    /// Decode an options payload; an empty or non-JSON payload is an error
    pub fn parse(options: &str) -> Result<Self> {
        Ok(serde_json::from_str(options)?)
    }

    /// Remote volume identifier, required by every call addressing a volume
    pub fn volume_id(&self) -> Result<&str> {
        match self.volume_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(FlexError::Validation(
                "volume needs the volumeID property in its flex options".to_string(),
            )),
        }
    }

    /// Requested filesystem, `ext4` when unset
    pub fn fs_type(&self) -> &str {
        if self.fs_type.is_empty() {
            DEFAULT_FS_TYPE
        } else {
            &self.fs_type
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_write == "ro"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orchestrator_payload() {
        let opts = VolumeOptions::parse(
            r#"{"kubernetes.io/fsType":"xfs","kubernetes.io/pvOrVolumeName":"prueba","kubernetes.io/readwrite":"ro","volumeID":"id0123456789","volumeName":"prueba"}"#,
        )
        .unwrap();

        assert_eq!(opts.fs_type(), "xfs");
        assert_eq!(opts.pv_or_volume_name, "prueba");
        assert!(opts.is_read_only());
        assert_eq!(opts.volume_name.as_deref(), Some("prueba"));
        assert_eq!(opts.volume_id().unwrap(), "id0123456789");
    }

    #[test]
    fn test_parse_bare_keys() {
        let opts = VolumeOptions::parse(
            r#"{"fsType":"ext4","pvOrVolumeName":"data","readwrite":"rw","volumeID":"v1"}"#,
        )
        .unwrap();
        assert_eq!(opts.pv_or_volume_name, "data");
        assert!(!opts.is_read_only());
    }

    #[test]
    fn test_defaults() {
        let opts = VolumeOptions::parse("{}").unwrap();
        assert_eq!(opts.fs_type(), "ext4");
        assert!(!opts.is_read_only());
    }

    #[test]
    fn test_missing_volume_id() {
        for payload in ["{}", r#"{"volumeID":""}"#] {
            let opts = VolumeOptions::parse(payload).unwrap();
            assert!(matches!(opts.volume_id(), Err(FlexError::Validation(_))));
        }
    }

    #[test]
    fn test_malformed_payload() {
        for payload in ["", "not json", "42"] {
            let err = VolumeOptions::parse(payload).unwrap_err();
            assert!(matches!(err, FlexError::InvalidOptions(_)), "{payload:?}");
        }
    }
}
