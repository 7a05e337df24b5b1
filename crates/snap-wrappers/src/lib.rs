//! Service units for snaps: rendering, installation, and supervision.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use snap_fs::Simplified;

pub use filesystem::{HostFilesystem, UnitFilesystem};
pub use notify::{Notifier, TracingNotifier, WarningNotifier};
pub use options::{ServiceOptions, SettingsError};
pub use services::ServiceManager;

mod filesystem;
mod notify;
mod options;
pub mod render;
mod services;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] snap_info::ValidationError),
    #[error("Failed to write unit file {}", path.user_display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Supervisor(#[from] snap_systemd::Error),
}
