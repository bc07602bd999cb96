//! Descriptor loading.
//!
//! Parses app.yaml into an [`AppConfig`]. Structural checks (paths, device
//! allow-list, volume types) happen during the render pass, not here.

use super::types::AppConfig;
use std::path::Path;

/// Parse an app.yaml file from disk.
pub fn parse_config_file(path: &Path) -> Result<AppConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_config(&content)
}

/// Parse an app.yaml from a string.
pub fn parse_config(yaml: &str) -> Result<AppConfig, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let yaml = r#"
values:
  ix_volumes:
    data: /mnt/pool/data
volumes:
  data:
    type: ix_volume
    ix_volume_config:
      dataset_name: data
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.volumes.len(), 1);
        assert_eq!(config.values.ix_volumes["data"], "/mnt/pool/data");
    }

    #[test]
    fn test_parse_empty_document() {
        let config = parse_config("{}").unwrap();
        assert!(config.devices.is_empty());
    }

    #[test]
    fn test_parse_device_missing_field() {
        let yaml = r#"
devices:
  - host_device: /dev/ttyUSB0
"#;
        let err = parse_config(yaml).unwrap_err();
        assert!(err.contains("YAML parse error"));
        assert!(err.contains("container_device"));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.yaml");
        std::fs::write(
            &path,
            r#"
devices:
  - host_device: /dev/ttyUSB0
    container_device: /dev/ttyUSB0
"#,
        )
        .unwrap();
        let config = parse_config_file(&path).unwrap();
        assert_eq!(config.devices[0].host_device, "/dev/ttyUSB0");
    }

    #[test]
    fn test_parse_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_config_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.contains("failed to read"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_config("not: [valid: yaml: {{");
        assert!(result.is_err());
    }
}
