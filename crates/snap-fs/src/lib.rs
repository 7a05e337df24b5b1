use std::io;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, trace};

pub use crate::path::*;

mod path;

/// Return a [`NamedTempFile`] in the specified directory, with the given permission `mode`.
///
/// ([`NamedTempFile`] defaults to `0o600`.)
#[cfg(unix)]
fn tempfile_in(dir: &Path, mode: u32) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(mode))
        .tempfile_in(dir)
}

/// Return a [`NamedTempFile`] in the specified directory.
#[cfg(not(unix))]
fn tempfile_in(dir: &Path, _mode: u32) -> io::Result<NamedTempFile> {
    tempfile::Builder::new().tempfile_in(dir)
}

/// Write `data` to `path` atomically using a temporary file and atomic rename.
///
/// The file ends up with permission `mode`. Missing parent directories are created with `0o755`.
/// Either `path` is fully replaced, or its previous content is left untouched.
pub fn write_atomic_sync(
    path: impl AsRef<Path>,
    data: impl AsRef<[u8]>,
    mode: u32,
) -> io::Result<()> {
    let path = path.as_ref();
    let Some(parent) = path.parent() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Cannot write to {}: path has no parent", path.user_display()),
        ));
    };
    create_dir_all(parent)?;

    let temp_file = tempfile_in(parent, mode)?;
    trace!(
        "Writing {} bytes to temporary file {}",
        data.as_ref().len(),
        temp_file.path().user_display()
    );
    fs_err::write(&temp_file, &data)?;
    set_mode(temp_file.path(), mode)?;
    temp_file.persist(path).map_err(|err| {
        io::Error::new(
            err.error.kind(),
            format!(
                "Failed to persist temporary file to {}: {}",
                path.user_display(),
                err.error
            ),
        )
    })?;
    debug!("Wrote {}", path.user_display());
    Ok(())
}

/// Remove the file at `path`, treating an already absent file as success.
///
/// Returns `true` if a file was removed.
pub fn remove_if_exists(path: impl AsRef<Path>) -> io::Result<bool> {
    match fs_err::remove_file(path.as_ref()) {
        Ok(()) => {
            debug!("Removed {}", path.as_ref().user_display());
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Create `dir` and all of its parents with mode `0o755`.
#[cfg(unix)]
fn create_dir_all(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(dir)
        .map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Failed to create directory {}: {err}", dir.user_display()),
            )
        })
}

#[cfg(not(unix))]
fn create_dir_all(dir: &Path) -> io::Result<()> {
    fs_err::create_dir_all(dir)
}

// The temporary file is created with `mode`, but the umask may have masked some bits off.
#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs_err::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
