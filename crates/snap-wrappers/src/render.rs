//! Rendering of service and socket unit files.
//!
//! Rendering is total: any app that passed [`snap_info::validate_app`] renders, and the same app
//! always renders to the same bytes.

use std::fmt::Display;

use snap_dirs::{PREREQUISITE_TARGET, SERVICES_TARGET, SOCKETS_TARGET};
use snap_info::{AppInfo, DaemonType, RestartCondition, SnapInfo, SocketInfo};
use snap_static::EnvVars;
use snap_systemd::mount_unit_name;

/// A unit file under construction.
#[derive(Debug, Default)]
struct UnitFile(String);

impl UnitFile {
    fn section(&mut self, name: &str) -> &mut Self {
        if !self.0.is_empty() {
            self.0.push('\n');
        }
        self.0.push('[');
        self.0.push_str(name);
        self.0.push_str("]\n");
        self
    }

    fn comment(&mut self, comment: &str) -> &mut Self {
        self.0.push_str("# ");
        self.0.push_str(comment);
        self.0.push('\n');
        self
    }

    fn directive(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.0.push_str(key);
        self.0.push('=');
        self.0.push_str(&value.to_string());
        self.0.push('\n');
        self
    }

    fn optional(&mut self, key: &str, value: Option<impl Display>) -> &mut Self {
        if let Some(value) = value {
            self.directive(key, value);
        }
        self
    }

    /// The dependencies shared by every unit of a snap: its mount, and the prerequisite target.
    fn snap_dependencies(&mut self, mount_unit: &str, after: &[String]) -> &mut Self {
        let mut ordering = format!("{mount_unit} {PREREQUISITE_TARGET}");
        for unit in after {
            ordering.push(' ');
            ordering.push_str(unit);
        }
        self.directive("Requires", mount_unit)
            .directive("Wants", PREREQUISITE_TARGET)
            .directive("After", ordering)
    }

    fn finish(self) -> String {
        self.0
    }
}

/// Render the service unit of `app`, which must be a service of `snap`.
pub fn service_unit(snap: &SnapInfo, app: &AppInfo) -> String {
    let mount_unit = mount_unit_name(&snap.mount_dir());
    let before = sibling_units(snap, &app.before);
    let after = sibling_units(snap, &app.after);

    // A oneshot service may not restart, and only counts as active between its start and its
    // stop command if told to remain so.
    let (restart, remain_after_exit) = if app.daemon == Some(DaemonType::Oneshot) {
        (RestartCondition::No, app.stop_command.is_some().then_some("yes"))
    } else {
        (app.restart_condition.unwrap_or_default(), None)
    };

    let mut unit = UnitFile::default();
    unit.section("Unit")
        .comment("Auto-generated, DO NOT EDIT")
        .directive(
            "Description",
            format!("Service for snap application {}", app.full_name()),
        )
        .snap_dependencies(&mount_unit, &after);
    if !before.is_empty() {
        unit.directive("Before", before.join(" "));
    }
    unit.directive("X-Snappy", "yes");

    unit.section("Service")
        .directive("ExecStart", app.launcher_command())
        .directive("SyslogIdentifier", app.full_name())
        .directive("Restart", restart)
        .directive("WorkingDirectory", snap.data_dir().display())
        .optional(
            "ExecStop",
            app.stop_command.as_ref().map(|_| app.launcher_stop_command()),
        )
        .optional(
            "ExecReload",
            app.reload_command
                .as_ref()
                .map(|_| app.launcher_reload_command()),
        )
        .optional(
            "ExecStopPost",
            app.post_stop_command
                .as_ref()
                .map(|_| app.launcher_post_stop_command()),
        )
        .optional(
            "TimeoutStopSec",
            app.stop_timeout.map(|timeout| timeout.as_secs_f64()),
        )
        .optional("Type", app.daemon)
        .optional("RemainAfterExit", remain_after_exit)
        .optional("BusName", app.bus_name.as_ref());

    // Socket-activated services are installed through their sockets.
    if app.sockets.is_empty() {
        unit.section("Install").directive("WantedBy", SERVICES_TARGET);
    }

    unit.finish()
}

/// Render the unit of one socket of `app`, which must be a service of `snap`.
pub fn socket_unit(snap: &SnapInfo, app: &AppInfo, socket: &SocketInfo) -> String {
    let mount_unit = mount_unit_name(&snap.mount_dir());

    let mut unit = UnitFile::default();
    unit.section("Unit")
        .comment("Auto-generated, DO NOT EDIT")
        .directive(
            "Description",
            format!(
                "Socket {} for snap application {}",
                socket.name,
                app.full_name()
            ),
        )
        .snap_dependencies(&mount_unit, &[])
        .directive("X-Snappy", "yes");

    unit.section("Socket")
        .directive("Service", app.service_unit_name())
        .directive("FileDescriptorName", &socket.name)
        .directive("ListenStream", listen_stream(snap, socket))
        .optional(
            "SocketMode",
            socket.socket_mode.map(|mode| format!("{mode:04o}")),
        );

    unit.section("Install").directive("WantedBy", SOCKETS_TARGET);

    unit.finish()
}

/// Render every socket unit of `app`, keyed by unit name, in declaration order.
///
/// Units are named after the keys of [`AppInfo::sockets`], like every other unit operation.
pub fn socket_units(snap: &SnapInfo, app: &AppInfo) -> Vec<(String, String)> {
    app.sockets
        .iter()
        .map(|(name, socket)| (app.socket_unit_name(name), socket_unit(snap, app, socket)))
        .collect()
}

/// Expand the data directory placeholders in the address of `socket`.
fn listen_stream(snap: &SnapInfo, socket: &SocketInfo) -> String {
    socket
        .listen_stream
        .replace(
            &format!("${}", EnvVars::SNAP_DATA),
            &snap.data_dir().to_string_lossy(),
        )
        .replace(
            &format!("${}", EnvVars::SNAP_COMMON),
            &snap.common_data_dir().to_string_lossy(),
        )
}

/// Resolve sibling app names to their service units, dropping names that are not services of
/// `snap`.
fn sibling_units(snap: &SnapInfo, names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter_map(|name| snap.app(name))
        .filter(|app| app.is_service())
        .map(AppInfo::service_unit_name)
        .collect()
}
