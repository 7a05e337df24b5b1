use std::path::PathBuf;
use std::slice;
use std::thread;

use tracing::{debug, warn};

use snap_dirs::Dirs;
use snap_fs::Simplified;
use snap_info::{AppInfo, SnapInfo, validate_app};
use snap_systemd::{DEFAULT_STOP_TIMEOUT, Signal, Supervisor};

use crate::filesystem::UnitFilesystem;
use crate::notify::Notifier;
use crate::options::ServiceOptions;
use crate::{Error, render};

/// The permissions unit files are written with.
const UNIT_FILE_MODE: u32 = 0o644;

/// Installs, starts, stops, and removes the services of snaps.
///
/// Installing and starting are all-or-nothing: on failure, the side effects performed so far are
/// undone before the error is returned. Removing is best-effort.
#[derive(Debug)]
pub struct ServiceManager<S, F, N> {
    dirs: Dirs,
    supervisor: S,
    filesystem: F,
    notifier: N,
    options: ServiceOptions,
}

/// The side effects of a partially completed installation.
#[derive(Debug, Default)]
struct Applied {
    written: Vec<PathBuf>,
    enabled: Vec<String>,
}

impl<S: Supervisor, F: UnitFilesystem, N: Notifier> ServiceManager<S, F, N> {
    pub fn new(dirs: Dirs, supervisor: S, filesystem: F, notifier: N) -> Self {
        Self {
            dirs,
            supervisor,
            filesystem,
            notifier,
            options: ServiceOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn supervisor(&self) -> &S {
        &self.supervisor
    }

    pub fn filesystem(&self) -> &F {
        &self.filesystem
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// The path of the unit file named `unit`.
    pub fn unit_path(&self, unit: &str) -> PathBuf {
        self.dirs.services_dir().join(unit)
    }

    /// Write and enable the units of every service of `snap`, then reload the supervisor.
    ///
    /// Every service is validated before anything is written. On failure, every unit enabled so
    /// far is disabled and every file written so far is removed.
    pub fn add_services(&self, snap: &SnapInfo) -> Result<(), Error> {
        for app in snap.services() {
            validate_app(app)?;
        }

        let mut applied = Applied::default();
        match self.install(snap, &mut applied) {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!("Failed to install services of `{}`: {err}", snap.name());
                self.unwind(applied);
                Err(err)
            }
        }
    }

    fn install(&self, snap: &SnapInfo, applied: &mut Applied) -> Result<(), Error> {
        for app in snap.services() {
            let service_unit = app.service_unit_name();
            self.write_unit(&service_unit, &render::service_unit(snap, app), applied)?;

            for (socket_unit, contents) in render::socket_units(snap, app) {
                self.write_unit(&socket_unit, &contents, applied)?;
            }

            self.supervisor.enable(&service_unit)?;
            applied.enabled.push(service_unit);
        }

        if !applied.enabled.is_empty() {
            self.supervisor.daemon_reload()?;
        }

        Ok(())
    }

    fn write_unit(&self, unit: &str, contents: &str, applied: &mut Applied) -> Result<(), Error> {
        let path = self.unit_path(unit);
        self.filesystem
            .write_atomic(&path, contents.as_bytes(), UNIT_FILE_MODE)
            .map_err(|source| Error::Filesystem {
                path: path.clone(),
                source,
            })?;
        applied.written.push(path);
        Ok(())
    }

    /// Undo a partial installation, reporting (but otherwise ignoring) any failures.
    fn unwind(&self, applied: Applied) {
        for unit in &applied.enabled {
            if let Err(err) = self.supervisor.disable(unit) {
                self.notifier.notify(&format!(
                    "while trying to disable {unit} due to previous failure: {err}"
                ));
            }
        }

        for path in &applied.written {
            if let Err(err) = self.filesystem.remove(path) {
                self.notifier.notify(&format!(
                    "while trying to remove {} due to previous failure: {err}",
                    path.user_display()
                ));
            }
        }

        if !applied.written.is_empty() {
            if let Err(err) = self.supervisor.daemon_reload() {
                self.notifier.notify(&format!(
                    "while trying to perform systemd daemon-reload due to previous failure: {err}"
                ));
            }
        }
    }

    /// Start the given services.
    ///
    /// Socket-activated services are started through their sockets; all other services are
    /// started together. On failure, every service started so far is stopped again.
    pub fn start_services(&self, apps: &[&AppInfo]) -> Result<(), Error> {
        let mut started = Vec::with_capacity(apps.len());
        match self.start(apps, &mut started) {
            Ok(()) => Ok(()),
            Err(err) => {
                for app in started.iter().rev() {
                    if let Err(err) = self.stop_service(app) {
                        self.notifier.notify(&format!(
                            "While trying to stop previously started service \"{}\": {err}",
                            app.service_unit_name()
                        ));
                    }
                }
                Err(err)
            }
        }
    }

    fn start<'app>(
        &self,
        apps: &[&'app AppInfo],
        started: &mut Vec<&'app AppInfo>,
    ) -> Result<(), Error> {
        let mut services = Vec::with_capacity(apps.len());
        for &app in apps {
            if !app.is_service() {
                continue;
            }

            // Recorded before its sockets, so that a partially started app is stopped too.
            started.push(app);

            if app.sockets.is_empty() {
                services.push(app.service_unit_name());
            }

            for socket_unit in app.socket_unit_names() {
                self.supervisor.enable(&socket_unit)?;
                self.supervisor.start(slice::from_ref(&socket_unit))?;
            }
        }

        if !services.is_empty() {
            self.supervisor.start(&services)?;
        }

        Ok(())
    }

    /// Stop a service and its sockets.
    ///
    /// A service that does not stop within its timeout is sent `SIGTERM` and, after the
    /// configured kill wait, `SIGKILL`. This counts as a successful stop.
    pub fn stop_service(&self, app: &AppInfo) -> Result<(), Error> {
        let service_unit = app.service_unit_name();
        let timeout = app.stop_timeout.unwrap_or(DEFAULT_STOP_TIMEOUT);

        let mut socket_error = None;
        for socket_unit in app.socket_unit_names() {
            if let Err(err) = self.supervisor.stop(&socket_unit, timeout) {
                debug!("Failed to stop `{socket_unit}`: {err}");
                socket_error.get_or_insert(err);
            }
        }

        match self.supervisor.stop(&service_unit, timeout) {
            Ok(()) => {}
            Err(err) if err.is_timeout() => self.kill(&service_unit),
            Err(err) => return Err(err.into()),
        }

        match socket_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn kill(&self, unit: &str) {
        self.notifier.notify(&format!("{unit} refused to stop, killing."));

        // Nothing left to try if signalling fails.
        if let Err(err) = self.supervisor.kill(unit, Signal::SIGTERM) {
            debug!("Ignoring failure to terminate `{unit}`: {err}");
        }
        thread::sleep(self.options.kill_wait);
        if let Err(err) = self.supervisor.kill(unit, Signal::SIGKILL) {
            debug!("Ignoring failure to kill `{unit}`: {err}");
        }
    }

    /// Stop the given services, skipping those whose unit file is not installed.
    pub fn stop_services(&self, apps: &[&AppInfo]) -> Result<(), Error> {
        for &app in apps {
            if !self.is_installed(app) {
                continue;
            }
            self.stop_service(app)?;
        }
        Ok(())
    }

    /// Disable and remove the units of every installed service of `snap`, then reload the
    /// supervisor.
    ///
    /// Failures to disable units or remove unit files are logged and skipped.
    pub fn remove_services(&self, snap: &SnapInfo) -> Result<(), Error> {
        let mut removed = 0usize;

        for app in snap.services() {
            if !self.is_installed(app) {
                continue;
            }
            removed += 1;

            let service_unit = app.service_unit_name();
            for socket_unit in app.socket_unit_names() {
                self.disable_unit(&socket_unit);
                self.remove_unit(&socket_unit, &service_unit);
            }

            self.disable_unit(&service_unit);
            self.remove_unit(&service_unit, &service_unit);
        }

        if removed > 0 {
            self.supervisor.daemon_reload()?;
        }

        Ok(())
    }

    fn disable_unit(&self, unit: &str) {
        if let Err(err) = self.supervisor.disable(unit) {
            warn!("Failed to disable `{unit}`: {err}");
        }
    }

    fn remove_unit(&self, unit: &str, service_unit: &str) {
        let path = self.unit_path(unit);
        if let Err(err) = self.filesystem.remove(&path) {
            warn!(
                "Failed to remove unit file {} of `{service_unit}`: {err}",
                path.user_display()
            );
        }
    }

    fn is_installed(&self, app: &AppInfo) -> bool {
        app.is_service() && self.filesystem.exists(&self.unit_path(&app.service_unit_name()))
    }
}
