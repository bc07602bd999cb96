//! The render pass: lower one app descriptor into manifest fragments.
//!
//! Builds one [`Devices`] and one [`Volumes`] per pass, adds every declared
//! resource in file order, and stops at the first validation failure.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Mapping;

use super::error::RenderError;
use super::types::AppConfig;
use crate::resources::device::Devices;
use crate::resources::mount::{MountEntry, ServiceMounts};
use crate::resources::volume::Volumes;

/// Manifest fragments ready for a compose serializer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedManifest {
    /// Service `devices:` list, sorted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,

    /// Top-level `volumes:` section
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub volumes: IndexMap<String, Mapping>,

    /// Service `volumes:` list (long syntax), sorted by target
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<MountEntry>,
}

/// Validate and lower every resource of `config`.
pub fn render_app(config: &AppConfig) -> Result<RenderedManifest, RenderError> {
    let mut devices = Devices::new(&config.values.resources)?;
    for d in &config.devices {
        devices.add_device(
            &d.host_device,
            &d.container_device,
            &d.cgroup_perm,
            d.allow_disallowed,
        )?;
    }

    let mut volumes = Volumes::new(&config.values.ix_volumes);
    for (identifier, volume) in &config.volumes {
        volumes.add_volume(identifier, volume)?;
    }

    let mut mounts = ServiceMounts::new(&volumes);
    for m in &config.mounts {
        mounts.add_mount(&m.volume, &m.target)?;
    }

    let manifest = RenderedManifest {
        devices: devices.render(),
        volumes: volumes.render(),
        mounts: mounts.render(),
    };
    debug!(
        "rendered {} devices, {} volumes ({} top-level), {} mounts",
        manifest.devices.len(),
        volumes.volume_identifiers().len(),
        manifest.volumes.len(),
        manifest.mounts.len()
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_config;
    use crate::resources::volume::MountType;

    const SAMPLE: &str = r#"
values:
  resources:
    gpus:
      use_all_gpus: true
  ix_volumes:
    config: /mnt/pool/ix-apps/config
devices:
  - host_device: /dev/ttyUSB0
    container_device: /dev/ttyUSB0
    cgroup_perm: rwm
  - host_device: /dev/ttyACM0
    container_device: /dev/zigbee
volumes:
  config:
    type: ix_volume
    ix_volume_config:
      dataset_name: config
  media:
    type: host_path
    read_only: true
    host_path_config:
      path: /mnt/tank/media
mounts:
  - volume: media
    target: /media
  - volume: config
    target: /config
"#;

    #[test]
    fn test_render_sample() {
        let config = parse_config(SAMPLE).unwrap();
        let manifest = render_app(&config).unwrap();

        assert_eq!(
            manifest.devices,
            vec![
                "/dev/dri:/dev/dri",
                "/dev/ttyACM0:/dev/zigbee",
                "/dev/ttyUSB0:/dev/ttyUSB0:rwm",
            ]
        );
        assert!(manifest.volumes.is_empty());
        assert_eq!(manifest.mounts.len(), 2);
        assert_eq!(manifest.mounts[0].target, "/config");
        assert_eq!(manifest.mounts[0].source, "/mnt/pool/ix-apps/config");
        assert_eq!(manifest.mounts[0].mount_type, MountType::Bind);
        assert!(manifest.mounts[1].read_only);
    }

    #[test]
    fn test_render_empty_sections_omitted() {
        let manifest = render_app(&AppConfig::default()).unwrap();
        assert_eq!(manifest, RenderedManifest::default());
        let yaml = serde_yaml_ng::to_string(&manifest).unwrap();
        assert_eq!(yaml.trim(), "{}");
    }

    #[test]
    fn test_render_gpu_conflict() {
        let yaml = r#"
values:
  resources:
    gpus:
      use_all_gpus: true
devices:
  - host_device: /dev/other
    container_device: /dev/dri
"#;
        let err = render_app(&parse_config(yaml).unwrap()).unwrap_err();
        assert_eq!(err.message, "Device with container path [/dev/dri] already added");
    }

    #[test]
    fn test_render_stops_at_bad_volume() {
        let yaml = r#"
volumes:
  data:
    type: ix_volume
    ix_volume_config:
      dataset_name: missing
"#;
        let err = render_app(&parse_config(yaml).unwrap()).unwrap_err();
        assert!(err.message.contains("Available keys: []"));
    }

    #[test]
    fn test_render_mount_of_undeclared_volume() {
        let yaml = r#"
mounts:
  - volume: data
    target: /data
"#;
        let err = render_app(&parse_config(yaml).unwrap()).unwrap_err();
        assert!(err.message.contains("Volume [data] not found"));
    }

    #[test]
    fn test_render_json() {
        let config = parse_config(SAMPLE).unwrap();
        let manifest = render_app(&config).unwrap();
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("\"type\":\"bind\""));
        assert!(!json.contains("\"volumes\""));
    }
}
