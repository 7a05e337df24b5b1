use std::ffi::OsString;
use std::path::{Path, PathBuf};

use snap_static::EnvVars;
use snap_warnings::warn_user_once;

/// The target that self-activating services are wanted by.
pub const SERVICES_TARGET: &str = "multi-user.target";

/// The target every snap unit softly depends on and is ordered after.
pub const PREREQUISITE_TARGET: &str = "network-online.target";

/// The target that socket units are wanted by.
pub const SOCKETS_TARGET: &str = "sockets.target";

/// The launcher that runs snap applications inside their confinement.
pub const SNAP_LAUNCHER: &str = "/usr/bin/snap";

/// The on-disk locations derived from a single global root directory.
///
/// Only locations that are *written to* are rooted. Paths that end up inside rendered unit text
/// (mount points, data directories) are always the real, root-independent paths; see
/// [`snap_mount_dir`] and friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirs {
    root: PathBuf,
}

impl Dirs {
    /// A directory layout beneath `root`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a new [`Dirs`] from settings.
    ///
    /// Prefer, in order:
    ///
    /// 1. The root directory specified by the user, i.e., `SNAPD_ROOT_DIR`, if absolute
    /// 2. The system root, `/`
    pub fn from_settings() -> Self {
        let Some(root) = std::env::var_os(EnvVars::SNAPD_ROOT_DIR) else {
            return Self::default();
        };
        match parse_path(root) {
            Ok(root) => Self::from_root(root),
            Err(root) => {
                warn_user_once!(
                    "Ignoring `{}`: `{}` is not an absolute path",
                    EnvVars::SNAPD_ROOT_DIR,
                    root.display()
                );
                Self::default()
            }
        }
    }

    /// The global root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` if this layout operates on the live system rather than a staged tree.
    pub fn is_system_root(&self) -> bool {
        self.root == Path::new("/")
    }

    /// The directory that service and socket unit files are installed into.
    pub fn services_dir(&self) -> PathBuf {
        self.root.join("etc/systemd/system")
    }
}

impl Default for Dirs {
    fn default() -> Self {
        Self::from_root("/")
    }
}

/// The directory a snap revision is mounted at, e.g., `/snap/hello/42`.
pub fn snap_mount_dir(name: &str, revision: &str) -> PathBuf {
    Path::new("/snap").join(name).join(revision)
}

/// The per-revision writable data directory of a snap, e.g., `/var/snap/hello/42`.
pub fn snap_data_dir(name: &str, revision: &str) -> PathBuf {
    Path::new("/var/snap").join(name).join(revision)
}

/// The revision-independent writable data directory of a snap, e.g., `/var/snap/hello/common`.
pub fn snap_common_data_dir(name: &str) -> PathBuf {
    Path::new("/var/snap").join(name).join("common")
}

/// Accept the given [`OsString`] only if it is an absolute path.
fn parse_path(path: OsString) -> Result<PathBuf, PathBuf> {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        Ok(path)
    } else {
        Err(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn services_dir_is_rooted() {
        let dirs = Dirs::from_root("/tmp/staging");
        assert_eq!(
            dirs.services_dir(),
            PathBuf::from("/tmp/staging/etc/systemd/system")
        );
        assert!(!dirs.is_system_root());
        assert!(Dirs::default().is_system_root());
    }

    #[test]
    fn snap_layout_ignores_root() {
        assert_eq!(snap_mount_dir("hello", "42"), PathBuf::from("/snap/hello/42"));
        assert_eq!(
            snap_data_dir("hello", "42"),
            PathBuf::from("/var/snap/hello/42")
        );
        assert_eq!(
            snap_common_data_dir("hello"),
            PathBuf::from("/var/snap/hello/common")
        );
    }

    #[test]
    fn relative_roots_are_rejected() {
        assert_eq!(
            parse_path(OsString::from("relative/root")),
            Err(PathBuf::from("relative/root"))
        );
        assert_eq!(
            parse_path(OsString::from("/abs")),
            Ok(PathBuf::from("/abs"))
        );
    }

    #[test]
    fn root_from_environment() {
        temp_env::with_var(EnvVars::SNAPD_ROOT_DIR, Some("/tmp/staging"), || {
            assert_eq!(Dirs::from_settings().root(), Path::new("/tmp/staging"));
        });
        temp_env::with_var(EnvVars::SNAPD_ROOT_DIR, Some("staging"), || {
            assert!(Dirs::from_settings().is_system_root());
        });
        temp_env::with_var_unset(EnvVars::SNAPD_ROOT_DIR, || {
            assert!(Dirs::from_settings().is_system_root());
        });
    }
}
