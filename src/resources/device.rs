//! Device pass-through lowering.
//!
//! A [`Device`] is one validated `host:container[:perm]` mapping. [`Devices`]
//! collects them for a single render pass. A host device may be exposed under
//! several container paths, but each container path is claimed at most once.

use std::collections::HashSet;

use log::{debug, trace};

use crate::core::error::RenderError;
use crate::core::types::Resources;
use crate::core::validation::{allowed_device, valid_cgroup_perm, valid_fs_path};

/// GPU render nodes, seeded when `resources.gpus.use_all_gpus` is set.
const GPU_DEVICE: &str = "/dev/dri";

/// One validated device mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device {
    host_device: String,
    container_device: String,
    cgroup_perm: String,
}

impl Device {
    /// Validate a device mapping.
    ///
    /// Fails if either path is empty after stripping trailing slashes, if
    /// `cgroup_perm` is not a valid permission string, or if `host_device`
    /// is reserved and `allow_disallowed` is false.
    pub fn new(
        host_device: &str,
        container_device: &str,
        cgroup_perm: &str,
        allow_disallowed: bool,
    ) -> Result<Self, RenderError> {
        let hd = valid_fs_path(host_device.trim_end_matches('/'))?;
        let cd = valid_fs_path(container_device.trim_end_matches('/'))?;
        if hd.is_empty() || cd.is_empty() {
            return Err(RenderError::new(format!(
                "Expected [host_device] and [container_device] to be set. \
                 Got host_device [{}] and container_device [{}]",
                host_device, container_device
            )));
        }

        let cgroup_perm = valid_cgroup_perm(cgroup_perm)?;
        let hd = if allow_disallowed {
            hd
        } else {
            allowed_device(&hd)?
        };

        Ok(Self {
            host_device: hd,
            container_device: cd,
            cgroup_perm,
        })
    }

    pub fn host_device(&self) -> &str {
        &self.host_device
    }

    pub fn container_device(&self) -> &str {
        &self.container_device
    }

    pub fn cgroup_perm(&self) -> &str {
        &self.cgroup_perm
    }

    /// Compose device syntax: `host:container` or `host:container:perm`.
    pub fn render(&self) -> String {
        let mut result = format!("{}:{}", self.host_device, self.container_device);
        if !self.cgroup_perm.is_empty() {
            result.push(':');
            result.push_str(&self.cgroup_perm);
        }
        result
    }
}

/// The devices of one render pass.
#[derive(Debug, Default)]
pub struct Devices {
    devices: HashSet<Device>,
    // Normalized container paths already claimed
    container_device_paths: HashSet<String>,
}

impl Devices {
    /// Create the collection and add the devices implied by `resources`.
    pub fn new(resources: &Resources) -> Result<Self, RenderError> {
        let mut devices = Self::default();
        devices.auto_add_devices(resources)?;
        Ok(devices)
    }

    fn auto_add_devices(&mut self, resources: &Resources) -> Result<(), RenderError> {
        if resources.gpus.use_all_gpus {
            debug!("use_all_gpus set, adding {}", GPU_DEVICE);
            self.add_device(GPU_DEVICE, GPU_DEVICE, "", true)?;
        }
        Ok(())
    }

    /// Validate and register a device mapping.
    ///
    /// Nothing is registered when validation fails.
    pub fn add_device(
        &mut self,
        host_device: &str,
        container_device: &str,
        cgroup_perm: &str,
        allow_disallowed: bool,
    ) -> Result<(), RenderError> {
        if self.container_device_paths.contains(container_device) {
            return Err(already_added(container_device));
        }

        let device = Device::new(host_device, container_device, cgroup_perm, allow_disallowed)?;
        if self.container_device_paths.contains(device.container_device()) {
            return Err(already_added(container_device));
        }

        trace!("device added: {}", device.render());
        self.container_device_paths
            .insert(device.container_device().to_string());
        self.devices.insert(device);
        Ok(())
    }

    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Rendered devices, sorted for stable manifests.
    pub fn render(&self) -> Vec<String> {
        let mut rendered: Vec<String> = self.devices.iter().map(Device::render).collect();
        rendered.sort();
        rendered
    }
}

fn already_added(container_device: &str) -> RenderError {
    RenderError::new(format!(
        "Device with container path [{}] already added",
        container_device
    ))
}
