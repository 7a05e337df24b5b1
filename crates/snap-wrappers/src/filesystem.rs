use std::io;
use std::path::Path;

/// The filesystem operations unit installation relies on.
pub trait UnitFilesystem {
    /// Replace the file at `path` with `contents`, or leave it untouched on failure.
    fn write_atomic(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Remove the file at `path`. A file that is already absent is not an error.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFilesystem;

impl UnitFilesystem for HostFilesystem {
    fn write_atomic(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        snap_fs::write_atomic_sync(path, contents, mode)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        snap_fs::remove_if_exists(path)?;
        Ok(())
    }
}
