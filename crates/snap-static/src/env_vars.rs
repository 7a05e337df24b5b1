/// Declares all environment variables read or expanded throughout the workspace.
pub struct EnvVars;

impl EnvVars {
    /// Overrides the global root directory that unit files are installed beneath.
    ///
    /// Defaults to `/`. Used by tests and image builders to operate on a staged tree.
    pub const SNAPD_ROOT_DIR: &'static str = "SNAPD_ROOT_DIR";

    /// Overrides the interval, in seconds, between the graceful and the forceful termination
    /// signal sent to a service that refused to stop.
    ///
    /// Accepts fractional values, e.g. `0.5`.
    pub const SNAPD_KILL_WAIT: &'static str = "SNAPD_KILL_WAIT";

    /// Placeholder for the per-revision writable data directory of a snap.
    ///
    /// Expanded inside socket `listen-stream` addresses as `$SNAP_DATA`.
    pub const SNAP_DATA: &'static str = "SNAP_DATA";

    /// Placeholder for the revision-independent writable data directory of a snap.
    ///
    /// Expanded inside socket `listen-stream` addresses as `$SNAP_COMMON`.
    pub const SNAP_COMMON: &'static str = "SNAP_COMMON";
}
