//! Descriptor and configuration types.
//!
//! Defines the YAML schema of an app descriptor: the read-only `values`
//! tree, device declarations, volume declarations, and service mounts.
//! All types derive Serialize/Deserialize for YAML roundtripping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Dataset name → host path, as provided by `values.ix_volumes`.
pub type IxVolumes = IndexMap<String, String>;

// ============================================================================
// Top-level app.yaml
// ============================================================================

/// Root descriptor: one app's devices, volumes, and mounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global configuration tree (read-only during rendering)
    #[serde(default)]
    pub values: Values,

    /// Device pass-through declarations
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,

    /// Volume declarations keyed by identifier (order-preserving).
    /// Kept untyped: each volume is dispatched on its `type` field.
    #[serde(default)]
    pub volumes: IndexMap<String, serde_yaml_ng::Value>,

    /// Per-service mounts referencing declared volumes
    #[serde(default)]
    pub mounts: Vec<MountSpec>,
}

// ============================================================================
// Values
// ============================================================================

/// The configuration tree the surrounding template system owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Values {
    #[serde(default)]
    pub resources: Resources,

    /// Named datasets available to `ix_volume` volumes
    #[serde(default)]
    pub ix_volumes: IxVolumes,
}

/// Resource opt-in flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default)]
    pub gpus: GpuResources,
}

/// GPU resource flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpuResources {
    /// Pass every GPU render node (`/dev/dri`) into the container
    #[serde(default)]
    pub use_all_gpus: bool,
}

// ============================================================================
// Declarations
// ============================================================================

/// A device declaration as written by the app author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub host_device: String,

    pub container_device: String,

    /// Empty means "use the runtime default"
    #[serde(default)]
    pub cgroup_perm: String,

    /// Skip the host device allow-list check
    #[serde(default)]
    pub allow_disallowed: bool,
}

/// A service mount: which volume, mounted where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountSpec {
    /// Identifier of a declared volume
    pub volume: String,

    /// Path inside the container
    pub target: String,
}

// ============================================================================
// Template helper
// ============================================================================

/// Convert a serde_yaml_ng::Value to a string for error messages.
pub fn yaml_value_to_string(val: &serde_yaml_ng::Value) -> String {
    match val {
        serde_yaml_ng::Value::String(s) => s.clone(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Null => String::new(),
        other => format!("{:?}", other),
    }
}
