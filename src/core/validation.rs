//! Low-level checks shared by device and volume lowering.
//!
//! - Filesystem paths are absolute, free of `..`, and never the root.
//! - Some host devices are reserved for dedicated resource flags.
//! - cgroup permissions are a non-repeating combination of `r`, `w`, `m`.

use super::error::RenderError;

/// Host devices that must be requested through their resource flag
/// (e.g. `resources.gpus.use_all_gpus`) rather than added by hand.
pub const DISALLOWED_DEVICES: &[&str] = &["/dev/dri", "/dev/bus/usb", "/dev/snd"];

/// Permission tokens in canonical order.
const CGROUP_TOKENS: [char; 3] = ['r', 'w', 'm'];

/// Validate and normalize a filesystem path.
///
/// Empty input is a valid "no path" signal and returns `""`; callers that
/// require a path must check for it.
pub fn valid_fs_path(raw: &str) -> Result<String, RenderError> {
    if raw.is_empty() {
        return Ok(String::new());
    }
    if !raw.starts_with('/') {
        return Err(RenderError::new(format!(
            "Expected path [{}] to be absolute",
            raw
        )));
    }

    let mut parts: Vec<&str> = Vec::new();
    for part in raw.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                return Err(RenderError::new(format!(
                    "Path [{}] must not contain [..] components",
                    raw
                )));
            }
            p => parts.push(p),
        }
    }

    if parts.is_empty() {
        return Err(RenderError::new(format!("Path [{}] cannot be [/]", raw)));
    }

    Ok(format!("/{}", parts.join("/")))
}

/// Reject host devices reserved for dedicated resource flags.
pub fn allowed_device(path: &str) -> Result<String, RenderError> {
    if DISALLOWED_DEVICES.contains(&path) {
        return Err(RenderError::new(format!(
            "Device [{}] is not allowed to be manually added. Disallowed devices: [{}]",
            path,
            DISALLOWED_DEVICES.join(", ")
        )));
    }
    Ok(path.to_string())
}

/// Validate a cgroup permission string, returning it in `rwm` order.
pub fn valid_cgroup_perm(perm: &str) -> Result<String, RenderError> {
    if perm.is_empty() {
        return Ok(String::new());
    }

    let mut seen = [false; 3];
    for c in perm.chars() {
        let idx = CGROUP_TOKENS
            .iter()
            .position(|t| *t == c)
            .ok_or_else(|| invalid_cgroup_perm(perm))?;
        if seen[idx] {
            return Err(invalid_cgroup_perm(perm));
        }
        seen[idx] = true;
    }

    Ok(CGROUP_TOKENS
        .iter()
        .zip(seen)
        .filter(|(_, set)| *set)
        .map(|(c, _)| *c)
        .collect())
}

fn invalid_cgroup_perm(perm: &str) -> RenderError {
    RenderError::new(format!(
        "Expected [cgroup_perm] to be a combination of [r, w, m] without repeats \
         (e.g. [r, rw, rwm]), got [{}]",
        perm
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_empty_passes_through() {
        assert_eq!(valid_fs_path("").unwrap(), "");
    }

    #[test]
    fn test_path_normalized() {
        assert_eq!(valid_fs_path("/mnt//data/./x/").unwrap(), "/mnt/data/x");
        assert_eq!(valid_fs_path("/dev/ttyUSB0").unwrap(), "/dev/ttyUSB0");
    }

    #[test]
    fn test_path_relative_rejected() {
        let err = valid_fs_path("mnt/data").unwrap_err();
        assert!(err.message.contains("absolute"));
        assert!(err.message.contains("mnt/data"));
    }

    #[test]
    fn test_path_parent_component_rejected() {
        let err = valid_fs_path("/mnt/../etc").unwrap_err();
        assert!(err.message.contains(".."));
    }

    #[test]
    fn test_path_root_rejected() {
        assert!(valid_fs_path("/").is_err());
        assert!(valid_fs_path("//.").is_err());
    }

    #[test]
    fn test_allowed_device() {
        assert_eq!(allowed_device("/dev/ttyUSB0").unwrap(), "/dev/ttyUSB0");
        let err = allowed_device("/dev/dri").unwrap_err();
        assert!(err.message.contains("/dev/dri"));
        assert!(err.message.contains("/dev/bus/usb"));
    }

    #[test]
    fn test_cgroup_perm_accepted() {
        assert_eq!(valid_cgroup_perm("").unwrap(), "");
        assert_eq!(valid_cgroup_perm("r").unwrap(), "r");
        assert_eq!(valid_cgroup_perm("rw").unwrap(), "rw");
        assert_eq!(valid_cgroup_perm("rwm").unwrap(), "rwm");
    }

    #[test]
    fn test_cgroup_perm_normalized() {
        assert_eq!(valid_cgroup_perm("mwr").unwrap(), "rwm");
        assert_eq!(valid_cgroup_perm("mr").unwrap(), "rm");
    }

    #[test]
    fn test_cgroup_perm_rejected() {
        assert!(valid_cgroup_perm("rr").is_err());
        assert!(valid_cgroup_perm("rx").is_err());
        let err = valid_cgroup_perm("all").unwrap_err();
        assert!(err.message.contains("[all]"));
    }
}
