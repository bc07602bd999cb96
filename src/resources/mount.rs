//! Service mount entries (compose long syntax) built from registered volumes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::volume::{MountType, Volumes};
use crate::core::error::RenderError;
use crate::core::validation::valid_fs_path;

/// One entry of a service's `volumes:` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountEntry {
    #[serde(rename = "type")]
    pub mount_type: MountType,
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

/// The mounts of one service.
#[derive(Debug)]
pub struct ServiceMounts<'v, 'a> {
    volumes: &'v Volumes<'a>,
    mounts: Vec<MountEntry>,
    targets: HashSet<String>,
}

impl<'v, 'a> ServiceMounts<'v, 'a> {
    pub fn new(volumes: &'v Volumes<'a>) -> Self {
        Self {
            volumes,
            mounts: Vec::new(),
            targets: HashSet::new(),
        }
    }

    /// Mount the volume registered as `identifier` at `target`.
    pub fn add_mount(&mut self, identifier: &str, target: &str) -> Result<(), RenderError> {
        let volume = self.volumes.get_volume(identifier)?;

        let target_path = valid_fs_path(target)?;
        if target_path.is_empty() {
            return Err(RenderError::new(format!(
                "Expected [target] to be set for mount of volume [{}]",
                identifier
            )));
        }
        if self.targets.contains(&target_path) {
            return Err(RenderError::new(format!(
                "Mount target [{}] already mounted",
                target_path
            )));
        }

        self.targets.insert(target_path.clone());
        self.mounts.push(MountEntry {
            mount_type: volume.vol_type(),
            source: volume.source().to_string(),
            target: target_path,
            read_only: volume.read_only(),
        });
        Ok(())
    }

    pub fn has_mounts(&self) -> bool {
        !self.mounts.is_empty()
    }

    /// Entries sorted by target.
    pub fn render(&self) -> Vec<MountEntry> {
        let mut entries = self.mounts.clone();
        entries.sort_by(|a, b| a.target.cmp(&b.target));
        entries
    }
}
