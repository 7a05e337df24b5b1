//! The subset of snap metadata consumed by the service wrappers.

use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;

use snap_dirs::SNAP_LAUNCHER;

pub use daemon::{DaemonType, RestartCondition, UnknownVariant};
pub use validate::{ValidationError, validate_app};

mod daemon;
mod validate;

/// The identity of a snap revision, shared by every app it declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SnapId {
    pub name: String,
    pub version: String,
    pub revision: String,
}

/// A snap, and the apps it declares in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapInfo {
    id: SnapId,
    apps: IndexMap<String, AppInfo>,
}

impl SnapInfo {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            id: SnapId {
                name: name.into(),
                version: version.into(),
                revision: revision.into(),
            },
            apps: IndexMap::new(),
        }
    }

    /// Add an app to this snap, replacing any app of the same name.
    #[must_use]
    pub fn with_app(mut self, app: AppInfo) -> Self {
        self.add_app(app);
        self
    }

    /// Add an app to this snap, replacing any app of the same name.
    pub fn add_app(&mut self, mut app: AppInfo) {
        app.snap = self.id.clone();
        self.apps.insert(app.name.clone(), app);
    }

    pub fn id(&self) -> &SnapId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn version(&self) -> &str {
        &self.id.version
    }

    pub fn revision(&self) -> &str {
        &self.id.revision
    }

    pub fn app(&self, name: &str) -> Option<&AppInfo> {
        self.apps.get(name)
    }

    /// All apps, in declaration order.
    pub fn apps(&self) -> impl Iterator<Item = &AppInfo> {
        self.apps.values()
    }

    /// The apps that are services, in declaration order.
    pub fn services(&self) -> impl Iterator<Item = &AppInfo> {
        self.apps.values().filter(|app| app.is_service())
    }

    /// The directory this revision is mounted at.
    pub fn mount_dir(&self) -> PathBuf {
        snap_dirs::snap_mount_dir(&self.id.name, &self.id.revision)
    }

    /// The per-revision writable data directory.
    pub fn data_dir(&self) -> PathBuf {
        snap_dirs::snap_data_dir(&self.id.name, &self.id.revision)
    }

    /// The revision-independent writable data directory.
    pub fn common_data_dir(&self) -> PathBuf {
        snap_dirs::snap_common_data_dir(&self.id.name)
    }
}

/// An app declared by a snap. Apps with a daemon type are services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInfo {
    /// The owning snap; filled in by [`SnapInfo::add_app`].
    pub snap: SnapId,
    pub name: String,
    pub command: String,
    pub stop_command: Option<String>,
    pub reload_command: Option<String>,
    pub post_stop_command: Option<String>,
    pub restart_condition: Option<RestartCondition>,
    pub daemon: Option<DaemonType>,
    pub bus_name: Option<String>,
    pub stop_timeout: Option<Duration>,
    pub sockets: IndexMap<String, SocketInfo>,
    /// Sibling apps this service must start before.
    pub before: Vec<String>,
    /// Sibling apps this service must start after.
    pub after: Vec<String>,
}

impl AppInfo {
    /// A plain (non-service) app running `command`.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            ..Self::default()
        }
    }

    /// A service of the given daemon type running `command`.
    pub fn service(
        name: impl Into<String>,
        command: impl Into<String>,
        daemon: DaemonType,
    ) -> Self {
        Self {
            daemon: Some(daemon),
            ..Self::new(name, command)
        }
    }

    #[must_use]
    pub fn with_socket(mut self, socket: SocketInfo) -> Self {
        self.sockets.insert(socket.name.clone(), socket);
        self
    }

    pub fn is_service(&self) -> bool {
        self.daemon.is_some()
    }

    /// The name of the security profile confining this app, e.g., `snap.hello.svc`.
    pub fn security_tag(&self) -> String {
        format!("snap.{}.{}", self.snap.name, self.name)
    }

    /// The fully-qualified app name, e.g., `hello.svc`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.snap.name, self.name)
    }

    /// The name of the service unit, e.g., `hello_svc_1.0.service`.
    pub fn service_unit_name(&self) -> String {
        format!("{}.service", self.unit_stem())
    }

    /// The name of the socket unit for the given socket.
    ///
    /// An app with a single socket gets `hello_svc_1.0.socket`; an app with several sockets gets
    /// one `hello_svc_1.0.<socket>.socket` unit per socket so the names never collide.
    pub fn socket_unit_name(&self, socket: &str) -> String {
        if self.sockets.len() == 1 {
            format!("{}.socket", self.unit_stem())
        } else {
            format!("{}.{socket}.socket", self.unit_stem())
        }
    }

    /// The names of every socket unit of this app, in declaration order.
    pub fn socket_unit_names(&self) -> impl Iterator<Item = String> + '_ {
        self.sockets.keys().map(|socket| self.socket_unit_name(socket))
    }

    /// The command line that starts this app inside its confinement.
    pub fn launcher_command(&self) -> String {
        format!("{SNAP_LAUNCHER} run {}", self.full_name())
    }

    pub fn launcher_stop_command(&self) -> String {
        self.launcher_hook_command("stop")
    }

    pub fn launcher_reload_command(&self) -> String {
        self.launcher_hook_command("reload")
    }

    pub fn launcher_post_stop_command(&self) -> String {
        self.launcher_hook_command("post-stop")
    }

    fn launcher_hook_command(&self, hook: &str) -> String {
        format!("{SNAP_LAUNCHER} run --command={hook} {}", self.full_name())
    }

    fn unit_stem(&self) -> String {
        format!("{}_{}_{}", self.snap.name, self.name, self.snap.version)
    }
}

/// A listening socket that activates a service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketInfo {
    pub name: String,
    /// The address to listen on; may reference `$SNAP_DATA` and `$SNAP_COMMON`.
    pub listen_stream: String,
    /// The file mode of a Unix domain socket, e.g., `0o660`.
    pub socket_mode: Option<u32>,
}

impl SocketInfo {
    pub fn new(name: impl Into<String>, listen_stream: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listen_stream: listen_stream.into(),
            socket_mode: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.socket_mode = Some(mode);
        self
    }
}
