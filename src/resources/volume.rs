//! Volume lowering.
//!
//! A volume descriptor is an untyped mapping whose `type` field selects one
//! parser. Each parser produces the same immutable [`Volume`] record: mount
//! type, source, typed sub-config, and an optional top-level volume spec.
//! Both supported types are bind mounts, so neither contributes to the
//! manifest's top-level `volumes:` section.

use std::fmt;

use indexmap::IndexMap;
use log::trace;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml_ng::{Mapping, Value};

use crate::core::error::RenderError;
use crate::core::types::{yaml_value_to_string, IxVolumes};
use crate::core::validation::valid_fs_path;

/// Supported values of a volume's `type` field.
pub const VOLUME_TYPES: &[&str] = &["host_path", "ix_volume"];

/// Compose mount type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountType {
    Bind,
}

impl fmt::Display for MountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => write!(f, "bind"),
        }
    }
}

// ============================================================================
// Type-specific configs
// ============================================================================

// Sub-configs come from UI forms where an unset field is often `null`; read
// it as the default so the "Expected [...] to be set" checks report it.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `host_path_config`: a raw host path, optionally behind an ACL path.
///
/// Keys this crate does not interpret are kept in `extra` for mount consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostPathConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub acl_enable: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub acl: AclConfig,

    #[serde(flatten)]
    pub extra: Mapping,
}

/// ACL settings of a host path. With ACLs enabled, `path` is the mount source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AclConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,

    #[serde(flatten)]
    pub extra: Mapping,
}

/// `ix_volume_config`: a dataset resolved through `values.ix_volumes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IxVolumeConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub dataset_name: String,

    #[serde(flatten)]
    pub extra: Mapping,
}

/// The validated sub-config of the handler that ran.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeTypeConfig {
    HostPath(HostPathConfig),
    IxVolume(IxVolumeConfig),
}

/// A named volume for the manifest's top-level `volumes:` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelVolume {
    pub name: String,
    pub spec: Mapping,
}

// ============================================================================
// Volume
// ============================================================================

/// One validated volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    identifier: String,
    mount_type: MountType,
    /// Host path for bind mounts, volume name for top-level volumes
    source: String,
    config: VolumeTypeConfig,
    top_level: Option<TopLevelVolume>,
    read_only: bool,
}

/// What a type parser resolves; the rest of [`Volume`] is shared.
struct Parsed {
    mount_type: MountType,
    source: String,
    config: VolumeTypeConfig,
    top_level: Option<TopLevelVolume>,
}

impl Volume {
    /// Parse and validate a volume descriptor.
    pub fn new(
        ix_volumes: &IxVolumes,
        identifier: &str,
        config: &Value,
    ) -> Result<Self, RenderError> {
        let vol_type = match config.get("type") {
            None | Some(Value::Null) => "",
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(invalid_type(&yaml_value_to_string(other))),
        };

        let parsed = match vol_type {
            "host_path" => parse_host_path(config)?,
            "ix_volume" => parse_ix_volume(config, ix_volumes)?,
            other => return Err(invalid_type(other)),
        };

        let read_only = match config.get("read_only") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(RenderError::new(format!(
                    "Expected [read_only] to be a boolean for volume [{}], got [{}]",
                    identifier,
                    yaml_value_to_string(other)
                )));
            }
        };

        Ok(Self {
            identifier: identifier.to_string(),
            mount_type: parsed.mount_type,
            source: parsed.source,
            config: parsed.config,
            top_level: parsed.top_level,
            read_only,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn vol_type(&self) -> MountType {
        self.mount_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn config(&self) -> &VolumeTypeConfig {
        &self.config
    }

    /// Generated name under the top-level `volumes:` section, if any.
    pub fn name(&self) -> Option<&str> {
        self.top_level.as_ref().map(|t| t.name.as_str())
    }

    /// Not every volume needs a top-level declaration; bind mounts never do.
    pub fn is_top_level_volume(&self) -> bool {
        self.top_level.is_some()
    }

    /// Top-level volume spec, or an empty mapping for bind mounts.
    pub fn render(&self) -> Mapping {
        match &self.top_level {
            Some(t) => t.spec.clone(),
            None => Mapping::new(),
        }
    }
}

fn invalid_type(vol_type: &str) -> RenderError {
    RenderError::new(format!(
        "Volume type [{}] is not valid. Valid options are: [{}]",
        vol_type,
        VOLUME_TYPES.join(", ")
    ))
}

/// Fetch and deserialize a required, non-empty sub-config.
fn sub_config<T: DeserializeOwned>(
    config: &Value,
    key: &str,
    vol_type: &str,
) -> Result<T, RenderError> {
    let raw = match config.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::Mapping(m)) if m.is_empty() => None,
        Some(v) => Some(v),
    }
    .ok_or_else(|| {
        RenderError::new(format!(
            "Expected [{}] to be set for [{}] type",
            key, vol_type
        ))
    })?;

    serde_yaml_ng::from_value(raw.clone()).map_err(|e| {
        RenderError::new(format!(
            "Invalid [{}] for [{}] type: {}",
            key, vol_type, e
        ))
    })
}

fn parse_host_path(config: &Value) -> Result<Parsed, RenderError> {
    let hpc: HostPathConfig = sub_config(config, "host_path_config", "host_path")?;
    if hpc.path.is_empty() {
        return Err(RenderError::new(
            "Expected [host_path_config.path] to be set for [host_path] type",
        ));
    }

    let path = if hpc.acl_enable {
        if hpc.acl.path.is_empty() {
            return Err(RenderError::new(
                "Expected [host_path_config.acl.path] to be set for [host_path] type with ACL enabled",
            ));
        }
        valid_fs_path(&hpc.acl.path)?
    } else {
        valid_fs_path(&hpc.path)?
    };

    Ok(Parsed {
        mount_type: MountType::Bind,
        source: path,
        config: VolumeTypeConfig::HostPath(hpc),
        top_level: None,
    })
}

fn parse_ix_volume(config: &Value, ix_volumes: &IxVolumes) -> Result<Parsed, RenderError> {
    let ivc: IxVolumeConfig = sub_config(config, "ix_volume_config", "ix_volume")?;
    if ivc.dataset_name.is_empty() {
        return Err(RenderError::new(
            "Expected [ix_volume_config.dataset_name] to be set for [ix_volume] type",
        ));
    }

    let host_path = ix_volumes.get(&ivc.dataset_name).ok_or_else(|| {
        RenderError::new(format!(
            "Expected the key [{}] to be set in [ix_volumes] for [ix_volume] type. \
             Available keys: [{}]",
            ivc.dataset_name,
            ix_volumes
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;

    let path = valid_fs_path(host_path.trim_end_matches('/'))?;
    if path.is_empty() {
        return Err(RenderError::new(format!(
            "Expected [ix_volumes.{}] to be a host path, got [{}]",
            ivc.dataset_name, host_path
        )));
    }

    Ok(Parsed {
        mount_type: MountType::Bind,
        source: path,
        config: VolumeTypeConfig::IxVolume(ivc),
        top_level: None,
    })
}

// ============================================================================
// Volumes
// ============================================================================

/// The volume registry of one render pass, in declaration order.
#[derive(Debug)]
pub struct Volumes<'a> {
    ix_volumes: &'a IxVolumes,
    volumes: IndexMap<String, Volume>,
}

impl<'a> Volumes<'a> {
    pub fn new(ix_volumes: &'a IxVolumes) -> Self {
        Self {
            ix_volumes,
            volumes: IndexMap::new(),
        }
    }

    /// Validate and register a volume under `identifier`.
    pub fn add_volume(&mut self, identifier: &str, config: &Value) -> Result<(), RenderError> {
        if identifier.is_empty() {
            return Err(RenderError::new("Volume name cannot be empty"));
        }
        if self.volumes.contains_key(identifier) {
            return Err(RenderError::new(format!(
                "Volume [{}] already added",
                identifier
            )));
        }

        let volume = Volume::new(self.ix_volumes, identifier, config)?;
        self.register(volume)
    }

    fn register(&mut self, volume: Volume) -> Result<(), RenderError> {
        // Top-level names share one manifest section
        if let Some(name) = volume.name() {
            if let Some(other) = self.volumes.values().find(|v| v.name() == Some(name)) {
                return Err(RenderError::new(format!(
                    "Volume [{}] generates top-level volume name [{}] already used by volume [{}]",
                    volume.identifier(),
                    name,
                    other.identifier()
                )));
            }
        }

        trace!(
            "volume added: {} ({} {})",
            volume.identifier(),
            volume.vol_type(),
            volume.source()
        );
        self.volumes.insert(volume.identifier().to_string(), volume);
        Ok(())
    }

    pub fn get_volume(&self, identifier: &str) -> Result<&Volume, RenderError> {
        self.volumes.get(identifier).ok_or_else(|| {
            RenderError::new(format!(
                "Volume [{}] not found in defined volumes. Available volumes: [{}]",
                identifier,
                self.volume_identifiers().join(", ")
            ))
        })
    }

    pub fn volume_identifiers(&self) -> Vec<&str> {
        self.volumes.keys().map(|k| k.as_str()).collect()
    }

    /// True iff any registered volume needs a top-level declaration.
    pub fn has_volumes(&self) -> bool {
        self.volumes.values().any(Volume::is_top_level_volume)
    }

    /// The manifest's top-level `volumes:` section.
    pub fn render(&self) -> IndexMap<String, Mapping> {
        self.volumes
            .values()
            .filter_map(|v| {
                v.top_level
                    .as_ref()
                    .map(|t| (t.name.clone(), t.spec.clone()))
            })
            .collect()
    }
}
