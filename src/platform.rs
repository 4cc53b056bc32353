//! Platform detection for the launcher.
//!
//! Detects the OS family and kernel version at runtime to decide whether
//! the overlay-mount mode is available at all.

use crate::constants::MIN_OVERLAY_KERNEL;

/// Detected platform information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Running under Windows (entry points dispatch through `cmd.exe`).
    pub is_windows: bool,
    /// Unprivileged overlay mounts are expected to work here.
    pub supports_overlay_mount: bool,
}

impl Platform {
    /// Detects the current platform.
    pub fn detect() -> Self {
        let supports_overlay_mount = cfg!(target_os = "linux")
            && Self::kernel_release()
                .as_deref()
                .is_some_and(release_supports_overlay);

        Self {
            is_windows: cfg!(target_os = "windows"),
            supports_overlay_mount,
        }
    }

    /// Detects the kernel release string.
    fn kernel_release() -> Option<String> {
        #[cfg(unix)]
        {
            use std::process::Command;
            Command::new("uname")
                .arg("-r")
                .output()
                .ok()
                .and_then(|o| String::from_utf8(o.stdout).ok())
                .map(|s| s.trim().to_string())
        }

        #[cfg(not(unix))]
        None
    }
}

/// Returns true when a kernel release string satisfies the overlay floor.
///
/// Components are compared as dotted integers; trailing non-digit suffixes
/// after a component's leading digits are ignored (`"6.1.0-arch1"` parses as
/// `(6, 1, 0)`). A release missing a needed component, or whose needed
/// component has no leading digits, does not satisfy the floor.
pub fn release_supports_overlay(release: &str) -> bool {
    release_at_least(release, MIN_OVERLAY_KERNEL).unwrap_or(false)
}

fn release_at_least(release: &str, floor: (u32, u32, u32)) -> Option<bool> {
    let mut components = release.split('.');
    let major = leading_int(components.next()?)?;
    if major != floor.0 {
        return Some(major > floor.0);
    }
    let minor = leading_int(components.next()?)?;
    if minor != floor.1 {
        return Some(minor > floor.1);
    }
    let patch = leading_int(components.next()?)?;
    Some(patch >= floor.2)
}

/// Parses the leading decimal digits of a version component.
fn leading_int(component: &str) -> Option<u32> {
    let end = component
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(component.len());
    component[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_at_floor_is_supported() {
        assert!(release_supports_overlay("5.12.0"));
    }

    #[test]
    fn test_release_below_floor_is_unsupported() {
        assert!(!release_supports_overlay("5.11.99"));
        assert!(!release_supports_overlay("4.19.250"));
    }

    #[test]
    fn test_distro_suffixes_are_tolerated() {
        assert!(release_supports_overlay("6.1.0-arch1"));
        assert!(release_supports_overlay("5.15.0-91-generic"));
        assert!(release_supports_overlay("5.12.0-rc1"));
    }

    #[test]
    fn test_greater_major_skips_remaining_components() {
        assert!(release_supports_overlay("6"));
        assert!(release_supports_overlay("10.0.0"));
    }

    #[test]
    fn test_greater_minor_skips_patch() {
        assert!(release_supports_overlay("5.13"));
    }

    #[test]
    fn test_missing_needed_component_is_parse_failure() {
        assert!(!release_supports_overlay("5"));
        assert!(!release_supports_overlay("5.12"));
    }

    #[test]
    fn test_garbage_is_parse_failure() {
        assert!(!release_supports_overlay(""));
        assert!(!release_supports_overlay("mach-o"));
        assert!(!release_supports_overlay("rc1.12.0"));
    }
}
